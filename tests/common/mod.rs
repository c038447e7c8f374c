/// Scripted stand-ins for the tool runner, the section log and the prompt

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;

use flagsweep::core::errors::{self, ExternalToolError};
use flagsweep::utils::prompt::Prompt;
use flagsweep::utils::section_log::SectionLog;
use flagsweep::utils::tools::{Invocation, ToolOutput, ToolRunner};

enum Scripted {
    Output(ToolOutput),
    Missing,
}

/// Tool runner that answers from a table keyed by program name
#[derive(Default)]
pub struct ScriptedRunner {
    responses: HashMap<String, Scripted>,
    pub captured: RefCell<Vec<Invocation>>,
    launched: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout(mut self, program: &str, stdout: &str) -> Self {
        self.responses.insert(
            program.to_string(),
            Scripted::Output(ToolOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                code: Some(0),
            }),
        );
        self
    }

    pub fn output(mut self, program: &str, output: ToolOutput) -> Self {
        self.responses.insert(program.to_string(), Scripted::Output(output));
        self
    }

    pub fn missing(mut self, program: &str) -> Self {
        self.responses.insert(program.to_string(), Scripted::Missing);
        self
    }

    pub fn captured_programs(&self) -> Vec<String> {
        self.captured.borrow().iter().map(|i| i.program.clone()).collect()
    }

    pub fn launched_programs(&self) -> Vec<String> {
        self.launched.borrow().iter().map(|i| i.program.clone()).collect()
    }
}

impl ToolRunner for ScriptedRunner {
    fn capture(&self, invocation: &Invocation) -> Result<ToolOutput, ExternalToolError> {
        self.captured.borrow_mut().push(invocation.clone());
        match self.responses.get(&invocation.program) {
            Some(Scripted::Output(output)) => Ok(output.clone()),
            Some(Scripted::Missing) => Err(ExternalToolError::NotFound {
                program: invocation.program.clone(),
            }),
            None => Ok(ToolOutput {
                code: Some(0),
                ..Default::default()
            }),
        }
    }

    fn launch(&self, invocation: &Invocation) -> Result<(), ExternalToolError> {
        self.launched.borrow_mut().push(invocation.clone());
        match self.responses.get(&invocation.program) {
            Some(Scripted::Missing) => Err(ExternalToolError::NotFound {
                program: invocation.program.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Section log kept in memory so entries can be inspected afterwards
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: RefCell<Vec<(String, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Section titles in append order
    pub fn sections(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|(section, _)| section.clone())
            .collect()
    }

    /// Body of the first entry with the given title
    pub fn body(&self, section: &str) -> Option<String> {
        self.entries
            .borrow()
            .iter()
            .find(|(s, _)| s == section)
            .map(|(_, body)| body.clone())
    }
}

impl SectionLog for MemoryLog {
    fn append(&self, section: &str, body: &str) -> errors::Result<()> {
        self.entries
            .borrow_mut()
            .push((section.to_string(), body.to_string()));
        Ok(())
    }
}

/// Replays a fixed list of answers; runs out as empty answers
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: RefCell<VecDeque<String>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// Questions asked so far, in order
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn input(&self, question: &str) -> io::Result<String> {
        self.asked.borrow_mut().push(question.to_string());
        Ok(self.answers.borrow_mut().pop_front().unwrap_or_default())
    }
}

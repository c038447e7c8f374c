/// File handler dispatch
///
/// Picks the set of external steps for the detected file type, runs them one
/// after another, appends every step's output to the section log and scans
/// it for flags. A failing tool is reported and logged, and the sequence
/// carries on with the next step.

use std::path::{Path, PathBuf};

use chrono::Local;
use colored::Colorize;
use log::{debug, info, warn};

use crate::core::errors::{ExternalToolError, ForensicsError, Result};
use crate::core::flags::FlagPattern;
use crate::core::header::{fixed_path, format_hex_dump, rewrite_header};
use crate::utils::file_utils::{detect_file_kind, file_size, read_header_hex, FileKind, HEADER_PREVIEW_BYTES};
use crate::utils::prompt::Prompt;
use crate::utils::section_log::SectionLog;
use crate::utils::tools::{Invocation, Step, ToolOutput, ToolRunner, DEFAULT_STEGSOLVE};

/// Steps run against every supported image, in order
pub const IMAGE_STEPS: [Step; 5] = [
    Step::Cat,
    Step::Strings,
    Step::Exiftool,
    Step::Binwalk,
    Step::Steghide,
];

/// Section title for the flag summary
pub const FLAGS_SECTION: &str = "possible flags";

/// Section title for the header preview of unrecognized files
pub const HEADER_SECTION: &str = "file header";

/// Section title for the outcome of the header prompt
pub const REPAIR_SECTION: &str = "header repair";

const STEGSOLVE_QUESTION: &str = "Run stegsolve? (y/n)";
const HEADER_QUESTION: &str =
    "File header is corrupt. Input new file header as hex string here, or \"n\" to do nothing";

/// The file under analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTarget {
    path: PathBuf,
    kind: FileKind,
    password: Option<String>,
}

impl AnalysisTarget {
    pub fn new<P: AsRef<Path>>(path: P, kind: FileKind, password: Option<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind,
            password,
        }
    }

    /// Build a target, detecting its type from the file's magic number
    pub fn detect<P: AsRef<Path>>(path: P, password: Option<String>) -> Result<Self> {
        let kind = detect_file_kind(path.as_ref())?;
        Ok(Self::new(path, kind, password))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Body of the run header section
    pub fn describe(&self) -> Result<String> {
        Ok(format!(
            "File: {}\nType: {}\nSize: {} bytes\nStarted: {}",
            self.path.display(),
            self.kind,
            file_size(&self.path)?,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ))
    }
}

/// Settings taken from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Launcher for the interactive bit-plane viewer
    pub stegsolve: String,
    /// Write `fixed_<name>` when a replacement header is entered
    pub write_header: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            stegsolve: DEFAULT_STEGSOLVE.to_string(),
            write_header: false,
        }
    }
}

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// All applicable steps ran
    Completed,
    /// The handler ends the run with a failure status (archives)
    Terminated,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed => 0,
            Outcome::Terminated => 1,
        }
    }
}

/// Result of one external step
#[derive(Debug)]
pub struct StepReport {
    pub step: Step,
    pub flags: Vec<String>,
    pub error: Option<ExternalToolError>,
}

/// Everything a dispatch produced
#[derive(Debug)]
pub struct RunSummary {
    pub outcome: Outcome,
    pub steps: Vec<StepReport>,
    /// The archive asked for a password
    pub password_protected: bool,
    /// Path of the repaired copy, if one was written
    pub header_written: Option<PathBuf>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            outcome: Outcome::Completed,
            steps: Vec::new(),
            password_protected: false,
            header_written: None,
        }
    }

    /// Steps in the order they ran
    pub fn steps_run(&self) -> Vec<Step> {
        self.steps.iter().map(|r| r.step).collect()
    }

    /// All flags found, in step order
    pub fn flags(&self) -> Vec<String> {
        self.steps.iter().flat_map(|r| r.flags.iter().cloned()).collect()
    }

    /// Steps whose tool failed
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|r| r.error.is_some())
    }
}

/// Log body for a step: its stdout, followed by the failure if there was one
fn step_body(stdout: &str, error: Option<&ExternalToolError>) -> String {
    match error {
        None => stdout.to_string(),
        Some(e) if stdout.is_empty() => format!("[!] {}", e),
        Some(e) => format!("{}\n[!] {}", stdout.trim_end_matches('\n'), e),
    }
}

/// Runs the handler for a target's type
pub struct Dispatcher<'a> {
    runner: &'a dyn ToolRunner,
    log: &'a dyn SectionLog,
    prompt: &'a dyn Prompt,
    pattern: Option<&'a FlagPattern>,
    options: DispatchOptions,
}

impl<'a> Dispatcher<'a> {
    pub fn new(runner: &'a dyn ToolRunner, log: &'a dyn SectionLog, prompt: &'a dyn Prompt) -> Self {
        Self {
            runner,
            log,
            prompt,
            pattern: None,
            options: DispatchOptions::default(),
        }
    }

    /// Scan every step's output with `pattern`
    pub fn with_pattern(mut self, pattern: Option<&'a FlagPattern>) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the handler matching the target's detected type
    pub fn dispatch(&self, target: &AnalysisTarget) -> Result<RunSummary> {
        info!("Dispatching {} as {}", target.path().display(), target.kind());

        let mut summary = RunSummary::new();
        match target.kind() {
            FileKind::Jpeg => self.handle_jpg_and_jpeg(target, &mut summary)?,
            FileKind::Png | FileKind::Bmp => self.handle_png_and_bmp(target, &mut summary)?,
            FileKind::Zip => self.handle_zip(target, &mut summary)?,
            FileKind::Unrecognized => self.handle_corrupt_header(target, &mut summary)?,
        }

        self.record_flags(&summary)?;
        Ok(summary)
    }

    fn handle_jpg_and_jpeg(&self, target: &AnalysisTarget, summary: &mut RunSummary) -> Result<()> {
        for step in IMAGE_STEPS {
            let (report, _) = self.run_step(target, step)?;
            summary.steps.push(report);
        }

        let launch = self.prompt.confirm(STEGSOLVE_QUESTION).map_err(ForensicsError::Prompt)?;
        if launch {
            summary.steps.push(self.launch_step(target, Step::Stegsolve)?);
        } else {
            debug!("Skipping stegsolve");
        }

        summary.outcome = Outcome::Completed;
        Ok(())
    }

    fn handle_png_and_bmp(&self, target: &AnalysisTarget, summary: &mut RunSummary) -> Result<()> {
        let (report, _) = self.run_step(target, Step::Zsteg)?;
        summary.steps.push(report);

        self.handle_jpg_and_jpeg(target, summary)
    }

    fn handle_zip(&self, target: &AnalysisTarget, summary: &mut RunSummary) -> Result<()> {
        let (report, output) = self.run_step(target, Step::Unzip)?;
        summary.steps.push(report);

        if output.stdout.contains("password") || output.stderr.contains("password") {
            println!(
                "{}",
                format!("{} is password protected!", target.path().display()).red().bold()
            );
            summary.password_protected = true;
        }

        summary.outcome = Outcome::Terminated;
        Ok(())
    }

    fn handle_corrupt_header(&self, target: &AnalysisTarget, summary: &mut RunSummary) -> Result<()> {
        let path = target.path();
        let dump = format_hex_dump(&read_header_hex(path, HEADER_PREVIEW_BYTES)?);

        println!("The first few bytes of '{}' are: {}", path.display(), dump);
        self.log.append(HEADER_SECTION, &dump)?;

        let answer = self.prompt.input(HEADER_QUESTION).map_err(ForensicsError::Prompt)?;
        let answer = answer.trim();

        summary.outcome = Outcome::Completed;
        if answer.is_empty() || answer.eq_ignore_ascii_case("n") {
            println!("Leaving {} unchanged.", path.display());
            return Ok(());
        }

        if !self.options.write_header {
            let note = format!(
                "Requested header: {}\nNot written; rerun with --write-header to create {}",
                format_hex_dump(answer),
                fixed_path(path).display()
            );
            println!("{}", note.yellow());
            self.log.append(REPAIR_SECTION, &note)?;
            return Ok(());
        }

        match rewrite_header(path, answer) {
            Ok(output) => {
                let note = format!("Wrote {} with header {}", output.display(), format_hex_dump(answer));
                println!("{}", note.green());
                self.log.append(REPAIR_SECTION, &note)?;
                summary.header_written = Some(output);
                Ok(())
            }
            Err(ForensicsError::Decode(e)) => {
                let note = format!("[!] invalid header hex '{}': {}", answer, e);
                eprintln!("{}", note.red());
                self.log.append(REPAIR_SECTION, &note)
            }
            Err(e) => Err(e),
        }
    }

    /// Run one captured step, log its output and scan it for flags
    fn run_step(&self, target: &AnalysisTarget, step: Step) -> Result<(StepReport, ToolOutput)> {
        println!("{} {}...", "Running".bold(), step);

        let invocation = self.invocation(target, step);
        let (output, error) = match self.runner.capture(&invocation) {
            Ok(output) => {
                let error = output.check(&invocation.program).err();
                (output, error)
            }
            Err(e) => (ToolOutput::default(), Some(e)),
        };

        if let Some(e) = &error {
            warn!("Step {} failed: {}", step, e);
            eprintln!("{} {}", "[!]".red().bold(), e);
        }

        self.log.append(step.name(), &step_body(&output.stdout, error.as_ref()))?;

        let flags = self.scan(step, &output.stdout);
        Ok((StepReport { step, flags, error }, output))
    }

    /// Start an interactive step; only the launch result is logged
    fn launch_step(&self, target: &AnalysisTarget, step: Step) -> Result<StepReport> {
        println!("{} {}...", "Running".bold(), step);

        let invocation = self.invocation(target, step);
        let error = self.runner.launch(&invocation).err();

        let body = match &error {
            None => format!("Launched {}", invocation.program),
            Some(e) => {
                warn!("Step {} failed: {}", step, e);
                eprintln!("{} {}", "[!]".red().bold(), e);
                format!("[!] {}", e)
            }
        };
        self.log.append(step.name(), &body)?;

        Ok(StepReport {
            step,
            flags: Vec::new(),
            error,
        })
    }

    fn invocation(&self, target: &AnalysisTarget, step: Step) -> Invocation {
        Invocation::for_step(step, target.path(), target.password(), &self.options.stegsolve)
    }

    fn scan(&self, step: Step, text: &str) -> Vec<String> {
        let Some(pattern) = self.pattern else {
            return Vec::new();
        };

        let flags = pattern.find_flags(text);
        if !flags.is_empty() {
            println!("{} {} output:", "[+] Possible flags in".green().bold(), step);
            for flag in &flags {
                println!("    {}", flag.cyan());
            }
        }
        flags
    }

    fn record_flags(&self, summary: &RunSummary) -> Result<()> {
        if self.pattern.is_none() {
            return Ok(());
        }

        let flags = summary.flags();
        if flags.is_empty() {
            println!("No flags matched.");
            return Ok(());
        }

        info!("{} possible flags found", flags.len());
        self.log.append(FLAGS_SECTION, &flags.join("\n"))
    }
}

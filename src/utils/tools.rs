/// External tool catalogue and runner
///
/// Every analysis step is an external program. Invocations are built as an
/// explicit argument vector and run without a shell, so file names are never
/// interpreted by anything but the target program.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::core::errors::ExternalToolError;

/// Default location of the stegsolve launcher
pub const DEFAULT_STEGSOLVE: &str = "/bin/stegsolve";

/// Analysis steps, in the vocabulary used for progress notices and log sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Raw content dump
    Cat,
    /// Printable string extraction
    Strings,
    /// Metadata extraction
    Exiftool,
    /// Recursive extraction of embedded files
    Binwalk,
    /// Steganographic payload extraction
    Steghide,
    /// LSB steganography scan
    Zsteg,
    /// Archive extraction
    Unzip,
    /// Interactive bit-plane viewer
    Stegsolve,
}

impl Step {
    /// Name used for notices and as the log section title
    pub fn name(&self) -> &'static str {
        match self {
            Step::Cat => "cat",
            Step::Strings => "strings",
            Step::Exiftool => "exiftool",
            Step::Binwalk => "binwalk",
            Step::Steghide => "steghide",
            Step::Zsteg => "zsteg",
            Step::Unzip => "unzip",
            Step::Stegsolve => "stegsolve",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A program plus its argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Build the invocation for `step` against `file`
    ///
    /// `password` is only used by steghide; without one the empty passphrase
    /// is tried. `stegsolve` is the launcher path for the viewer.
    pub fn for_step(step: Step, file: &Path, password: Option<&str>, stegsolve: &str) -> Self {
        match step {
            Step::Cat => Invocation::new("cat").arg(file),
            Step::Strings => Invocation::new("strings").arg(file),
            Step::Exiftool => Invocation::new("exiftool").arg(file),
            Step::Binwalk => Invocation::new("binwalk").arg("-Me").arg(file),
            Step::Steghide => Invocation::new("steghide")
                .arg("extract")
                .arg("-sf")
                .arg(file)
                .arg("-p")
                .arg(password.unwrap_or("")),
            Step::Zsteg => Invocation::new("zsteg").arg("-a").arg(file),
            Step::Unzip => Invocation::new("unzip").arg(file),
            Step::Stegsolve => Invocation::new(stegsolve),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {:?}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a failed exit into an error, keeping stderr for the report
    pub fn check(&self, program: &str) -> Result<(), ExternalToolError> {
        if self.success() {
            Ok(())
        } else {
            Err(ExternalToolError::NonZeroExit {
                program: program.to_string(),
                code: self.code,
                stderr: self.stderr.clone(),
            })
        }
    }
}

/// Runs external programs
pub trait ToolRunner {
    /// Run to completion and capture stdout and stderr
    fn capture(&self, invocation: &Invocation) -> Result<ToolOutput, ExternalToolError>;

    /// Start an interactive program with the terminal attached and wait for it
    fn launch(&self, invocation: &Invocation) -> Result<(), ExternalToolError>;
}

fn spawn_error(program: &str, source: io::Error) -> ExternalToolError {
    if source.kind() == io::ErrorKind::NotFound {
        ExternalToolError::NotFound {
            program: program.to_string(),
        }
    } else {
        ExternalToolError::Spawn {
            program: program.to_string(),
            source,
        }
    }
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Clone)]
pub struct SystemRunner {
    show_progress: bool,
}

impl SystemRunner {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    fn spinner(&self, invocation: &Invocation) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb.set_message(invocation.program.clone());
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ToolRunner for SystemRunner {
    fn capture(&self, invocation: &Invocation) -> Result<ToolOutput, ExternalToolError> {
        debug!("Capturing: {}", invocation);

        let spinner = self.spinner(invocation);
        let result = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output();
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let output = result.map_err(|e| spawn_error(&invocation.program, e))?;
        let captured = ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        };

        info!(
            "{} finished with {:?} ({} bytes of output)",
            invocation.program,
            captured.code,
            captured.stdout.len()
        );
        Ok(captured)
    }

    fn launch(&self, invocation: &Invocation) -> Result<(), ExternalToolError> {
        debug!("Launching: {}", invocation);

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|e| spawn_error(&invocation.program, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(ExternalToolError::NonZeroExit {
                program: invocation.program.clone(),
                code: status.code(),
                stderr: String::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(invocation: &Invocation) -> Vec<String> {
        invocation
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_step_invocations() {
        let file = Path::new("cat pic;rm -rf.jpg");

        let binwalk = Invocation::for_step(Step::Binwalk, file, None, DEFAULT_STEGSOLVE);
        assert_eq!(binwalk.program, "binwalk");
        assert_eq!(args(&binwalk), vec!["-Me", "cat pic;rm -rf.jpg"]);

        let zsteg = Invocation::for_step(Step::Zsteg, file, None, DEFAULT_STEGSOLVE);
        assert_eq!(args(&zsteg), vec!["-a", "cat pic;rm -rf.jpg"]);

        let stegsolve = Invocation::for_step(Step::Stegsolve, file, None, "/opt/stegsolve");
        assert_eq!(stegsolve.program, "/opt/stegsolve");
        assert!(stegsolve.args.is_empty());
    }

    #[test]
    fn test_steghide_password() {
        let file = Path::new("pic.jpg");

        let without = Invocation::for_step(Step::Steghide, file, None, DEFAULT_STEGSOLVE);
        assert_eq!(args(&without), vec!["extract", "-sf", "pic.jpg", "-p", ""]);

        let with = Invocation::for_step(Step::Steghide, file, Some("hunter2"), DEFAULT_STEGSOLVE);
        assert_eq!(args(&with), vec!["extract", "-sf", "pic.jpg", "-p", "hunter2"]);
    }

    #[test]
    fn test_tool_output_check() {
        let ok = ToolOutput {
            code: Some(0),
            ..Default::default()
        };
        assert!(ok.check("cat").is_ok());

        let failed = ToolOutput {
            stderr: "boom".to_string(),
            code: Some(3),
            ..Default::default()
        };
        assert!(matches!(
            failed.check("cat"),
            Err(ExternalToolError::NonZeroExit { code: Some(3), .. })
        ));
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let runner = SystemRunner::new(false);
        let invocation = Invocation::new("flagsweep-definitely-not-installed");
        assert!(matches!(
            runner.capture(&invocation),
            Err(ExternalToolError::NotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_stdout() {
        let runner = SystemRunner::new(false);
        let output = runner
            .capture(&Invocation::new("sh").arg("-c").arg("echo hello; exit 4"))
            .unwrap();
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.code, Some(4));
        assert!(!output.success());
    }
}

/// flagsweep - runs the usual forensics tools against a CTF file
///
/// The main entry point. It parses command-line arguments, checks the
/// preconditions and hands the file to the dispatcher.

use std::fs::File;
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{ArgAction, Parser};
use colored::Colorize;
use log::{error, info, LevelFilter};

use flagsweep::core::dispatcher::{AnalysisTarget, DispatchOptions, Dispatcher, Outcome};
use flagsweep::core::errors::ForensicsError;
use flagsweep::core::flags::build_pattern;
use flagsweep::core::preflight::{check_file_exists, check_root};
use flagsweep::utils::prompt::TerminalPrompt;
use flagsweep::utils::section_log::{FileLog, SectionLog, DEFAULT_LOG_FILE};
use flagsweep::utils::tools::{SystemRunner, DEFAULT_STEGSOLVE};

/// Command line argument structure
#[derive(Parser, Debug)]
#[command(
    name = "flagsweep",
    version,
    about = "Automates basic checks for CTF forensics challenges",
    long_about = "Runs a fixed set of forensics tools against one file, chosen by its type:
- jpeg: cat, strings, exiftool, binwalk, steghide, then optionally stegsolve
- png/bmp: zsteg, then everything run for jpeg
- zip: unzip, reporting password protection
- anything else: shows the leading bytes and asks for a replacement header

Every tool's output is appended to a section log. With --flag-format the
output is also searched for the flag and its ROT13 form. Must be run as root."
)]
struct Args {
    /// File to analyze
    #[arg(name = "FILENAME")]
    filename: PathBuf,

    /// Regex describing the flag, e.g. 'picoctf\{.*\}'
    #[arg(short = 'f', long = "flag-format")]
    flag_format: Option<String>,

    /// Passphrase for steghide (default: empty passphrase)
    #[arg(short = 'p', long = "password")]
    password: Option<String>,

    /// Section log path (default: flagsweep_log.txt)
    #[arg(long = "log-file", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Stegsolve launcher (default: /bin/stegsolve)
    #[arg(long = "stegsolve", default_value = DEFAULT_STEGSOLVE)]
    stegsolve: String,

    /// Write fixed_<FILENAME> when a replacement header is entered
    #[arg(long = "write-header", action = ArgAction::SetTrue)]
    write_header: bool,

    /// Diagnostic log file (default: stderr only)
    #[arg(long = "debug-log")]
    debug_log: Option<PathBuf>,

    /// Set logging level (default: WARN)
    #[arg(long = "log-level", default_value = "warn")]
    log_level: LevelFilter,
}

/// Main entry point function
fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args);

    println!("{} {}\n", "flagsweep".bold(), flagsweep::VERSION);

    match run(&args) {
        Ok(outcome) => {
            if outcome != Outcome::Completed {
                process::exit(outcome.exit_code());
            }
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.to_string().red());
            process::exit(1);
        }
    }
}

/// Set up diagnostic logging
fn setup_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    builder.filter_level(args.log_level);

    builder.format(|buf, record| {
        use chrono::Local;
        use std::io::Write;
        writeln!(
            buf,
            "{} - {} - {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(path) = &args.debug_log {
        match File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Cannot open {}: {}", path.display(), e),
        }
    }

    builder.init();
}

/// Check preconditions, then dispatch the file
fn run(args: &Args) -> Result<Outcome, ForensicsError> {
    check_root()?;
    check_file_exists(&args.filename)?;

    let pattern = args.flag_format.as_deref().map(build_pattern).transpose()?;
    if let Some(pattern) = &pattern {
        info!("Flag pattern: {}", pattern.as_str());
    }

    let target = AnalysisTarget::detect(&args.filename, args.password.clone())?;
    println!(
        "{} {} ({})",
        "Analyzing".bold(),
        target.path().display(),
        target.kind().to_string().cyan()
    );

    let log = FileLog::new(&args.log_file);
    log.append("target", &target.describe()?)?;

    let runner = SystemRunner::default();
    let prompt = TerminalPrompt;
    let options = DispatchOptions {
        stegsolve: args.stegsolve.clone(),
        write_header: args.write_header,
    };

    let summary = Dispatcher::new(&runner, &log, &prompt)
        .with_pattern(pattern.as_ref())
        .with_options(options)
        .dispatch(&target)?;

    let failures = summary.failures().count();
    println!(
        "\n{} {} steps run, {} failed, {} possible flags. Output logged to {}",
        "Done:".green().bold(),
        summary.steps.len(),
        failures,
        summary.flags().len(),
        log.path().display()
    );

    Ok(summary.outcome)
}

//! CLI entry point for the LS-8 machine.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use ls8_core::{
    load_file, Machine, StdoutConsole, StepOutcome, SystemClock,
};
#[cfg(test)]
use tempfile as _;

const USAGE_TEXT: &str = "\
Usage: ls8 [--trace] <program.ls8>

Runs an LS-8 program: a text file with one instruction byte per line,
written as an 8-bit binary number. Lines starting with '#' are comments.

Options:
  --trace     Print a machine-state trace line to stderr before each cycle
  -h, --help  Show this help message

Example:
  ls8 print8.ls8
";

#[derive(Debug, PartialEq, Eq)]
struct Args {
    program: PathBuf,
    trace: bool,
}

#[derive(Debug)]
enum ParseResult {
    Run(Args),
    Help,
}

fn parse_args(args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut program: Option<PathBuf> = None;
    let mut trace = false;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "--trace" {
            trace = true;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if program.is_some() {
            return Err("multiple program paths provided".to_string());
        }
        program = Some(PathBuf::from(arg));
    }

    let program = program.ok_or_else(|| "missing program path".to_string())?;
    Ok(ParseResult::Run(Args { program, trace }))
}

fn run(args: &Args) -> Result<(), String> {
    let image = load_file(&args.program)
        .map_err(|e| format!("{}: {e}", args.program.display()))?;

    let mut machine = Machine::default();
    machine
        .load(&image)
        .map_err(|e| format!("{}: {e}", args.program.display()))?;

    let mut clock = SystemClock::new();
    let mut console = StdoutConsole;

    let outcome = if args.trace {
        loop {
            eprintln!("{}", machine.trace());
            match machine.step(&mut clock, &mut console) {
                Ok(StepOutcome::Halted) => break Ok(()),
                Ok(StepOutcome::Executed | StepOutcome::InterruptEntered { .. }) => {}
                Err(fault) => break Err(fault),
            }
        }
    } else {
        machine.run(&mut clock, &mut console)
    };

    outcome.map_err(|fault| format!("machine fault: {fault}"))
}

fn main() -> ExitCode {
    match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            ExitCode::SUCCESS
        }
        Ok(ParseResult::Run(args)) => match run(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            ExitCode::FAILURE
        }
    }
}

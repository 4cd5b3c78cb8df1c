//! Native launcher for the PyQt GUI frontend.
//!
//! Checks that the project-local virtual environment exists, then hands
//! off to the GUI scanner script and waits for it, exiting with the
//! child's exit code. When the environment is missing it prints setup
//! instructions and exits with code 1 instead.
//!
//! Takes no arguments and reads no environment variables; the two paths
//! are fixed relative to the working directory.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::process::{Command, ExitCode};

use anyhow::{Context, Result};

#[cfg(windows)]
const VENV_PYTHON: &str = r"venv\Scripts\python.exe";
#[cfg(not(windows))]
const VENV_PYTHON: &str = "venv/bin/python";

#[cfg(windows)]
const VENV_PIP: &str = r"venv\Scripts\pip";
#[cfg(not(windows))]
const VENV_PIP: &str = "venv/bin/pip";

const GUI_SCRIPT: &str = "apps/gui_scanner.py";

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let interpreter = Path::new(VENV_PYTHON);

    if !interpreter.exists() {
        report_missing_environment();
        return Ok(ExitCode::from(1));
    }

    println!("Starting GUI scanner...");
    let status = Command::new(interpreter)
        .arg(GUI_SCRIPT)
        .status()
        .with_context(|| format!("failed to start {}", interpreter.display()))?;

    // A child killed by a signal has no exit code; treat it as failed.
    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

fn report_missing_environment() {
    println!("Python environment not found at {VENV_PYTHON}");
    println!();
    println!("Set it up and install the GUI dependencies:");
    println!("  python -m venv venv");
    println!("  {VENV_PIP} install -r requirements.txt");

    // Keep the console window open when started from a file manager, but
    // never block a non-interactive caller.
    if io::stdin().is_terminal() {
        print!("Press Enter to exit...");
        let _ = io::stdout().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }
}

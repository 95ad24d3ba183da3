use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use rubytest_core::cli::{Cli, Command};
use rubytest_core::persistence::Database;
use rubytest_core::runner::TerminalSink;
use rubytest_core::settings::{self, Settings};
use rubytest_core::types::PlannedRun;
use tracing_subscriber::EnvFilter;

/// What to do once the command has been handled.
enum Outcome {
    /// Print a response line to stdout and exit 0.
    Print(String),
    /// Print text exactly as given (an edited buffer).
    Text(String),
    /// Output was already streamed; exit with the child's status.
    Exit(i32),
}

fn json<T: Serialize>(value: &T) -> Result<Outcome, Box<dyn std::error::Error>> {
    Ok(Outcome::Print(serde_json::to_string(value)?))
}

fn open_state(state_dir: Option<&Path>) -> Result<Database, Box<dyn std::error::Error>> {
    let dir: PathBuf = match state_dir {
        Some(dir) => dir.to_path_buf(),
        None => settings::default_state_dir()
            .ok_or("could not determine a state directory, pass --state-dir")?,
    };
    Ok(rubytest_core::open_db(&dir)?)
}

/// Print the plan for `--dry-run`, otherwise run it in the foreground.
fn dispatch(
    planned: PlannedRun,
    dry_run: bool,
    state_dir: Option<&Path>,
    settings: &Settings,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    if dry_run {
        return json(&planned);
    }
    let db = open_state(state_dir)?;
    let mut sink = TerminalSink::new();
    let outcome = rubytest_core::execute(&db, &planned, settings, &mut sink)?;
    Ok(Outcome::Exit(outcome.exit_code.unwrap_or(1)))
}

fn run() -> Result<Outcome, Box<dyn std::error::Error>> {
    let Cli {
        config,
        state_dir,
        command,
    } = Cli::parse();
    let settings = Settings::load(config.as_deref())?;
    let state_dir = state_dir.as_deref();

    match command {
        Command::Classify { file } => json(&rubytest_core::classify_file(&file)?),
        Command::TestName {
            file,
            buffer,
            offset,
        } => {
            let text = rubytest_core::read_source(&file, buffer.as_deref())?;
            json(&rubytest_core::test_name_at(&file, &text, offset, &settings)?)
        }
        Command::RunSingle {
            file,
            buffer,
            offset,
            folders,
            dry_run,
        } => {
            let text = rubytest_core::read_source(&file, buffer.as_deref())?;
            let planned =
                rubytest_core::plan_single_test(&file, &text, offset, &folders, &settings)?;
            dispatch(planned, dry_run, state_dir, &settings)
        }
        Command::RunAll {
            file,
            folders,
            dry_run,
        } => {
            let planned = rubytest_core::plan_all_tests(&file, &folders, &settings)?;
            dispatch(planned, dry_run, state_dir, &settings)
        }
        Command::Verify { file, dry_run } => {
            let planned = rubytest_core::plan_verify(&file, &settings)?;
            dispatch(planned, dry_run, state_dir, &settings)
        }
        Command::RunLast { dry_run } => {
            let db = open_state(state_dir)?;
            let planned = rubytest_core::plan_last_run(&db, &settings)?;
            drop(db);
            dispatch(planned, dry_run, state_dir, &settings)
        }
        Command::RailsGenerate {
            argument,
            folders,
            dry_run,
        } => {
            let planned = rubytest_core::plan_rails_generate(&argument, &folders, &settings)?;
            dispatch(planned, dry_run, state_dir, &settings)
        }
        Command::Alternate { file, folders } => {
            json(&rubytest_core::find_alternates(&file, &folders, &settings)?)
        }
        Command::ExtractVariable {
            file,
            buffer,
            start,
            end,
            name,
        } => {
            let text = rubytest_core::read_source(&file, buffer.as_deref())?;
            let edited = rubytest_core::extract_variable(&file, &text, start, end, &name)?;
            Ok(Outcome::Text(edited))
        }
        Command::History { limit } => {
            let db = open_state(state_dir)?;
            json(&rubytest_core::history::recent_runs(&db, limit)?)
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    match run() {
        Ok(Outcome::Print(text)) => {
            println!("{text}");

            // Flush stdout so the adapter sees the response immediately
            if let Err(e) = std::io::stdout().flush() {
                eprintln!("Warning: stdout flush failed: {e}");
            }
        }
        Ok(Outcome::Text(text)) => {
            print!("{text}");
            if let Err(e) = std::io::stdout().flush() {
                eprintln!("Warning: stdout flush failed: {e}");
            }
        }
        Ok(Outcome::Exit(code)) => {
            let _ = std::io::stdout().flush();
            process::exit(code);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

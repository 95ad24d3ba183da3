use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "rubytest-core",
    version,
    about = "Run the Ruby test under the cursor from any editor"
)]
pub struct Cli {
    /// Settings file (JSON). Defaults to <config dir>/rubytest/settings.json
    #[arg(long, global = true, env = "RUBYTEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where the last-run record and run history are kept
    #[arg(long, global = true, env = "RUBYTEST_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the file kind, its capabilities and conventional counterparts
    Classify {
        /// Absolute path of the file
        #[arg(long)]
        file: PathBuf,
    },

    /// Print the test selected by the cursor position
    TestName {
        #[arg(long)]
        file: PathBuf,

        /// Unsaved buffer contents to search instead of the file on disk
        #[arg(long)]
        buffer: Option<PathBuf>,

        /// Cursor position as a character offset
        #[arg(long)]
        offset: usize,
    },

    /// Run the single test at the cursor
    RunSingle {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        buffer: Option<PathBuf>,

        #[arg(long)]
        offset: usize,

        /// Open project folder (repeatable)
        #[arg(long = "folder")]
        folders: Vec<PathBuf>,

        /// Print the command instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Run every test in the file
    RunAll {
        #[arg(long)]
        file: PathBuf,

        #[arg(long = "folder")]
        folders: Vec<PathBuf>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Check Ruby, ERB or Haml syntax of the file
    Verify {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        dry_run: bool,
    },

    /// Run the last recorded command again
    RunLast {
        #[arg(long)]
        dry_run: bool,
    },

    /// Run `rails generate <argument>` in the project folder
    RailsGenerate {
        /// Generator and its arguments, e.g. "migration AddNameToUsers"
        #[arg(long)]
        argument: String,

        #[arg(long = "folder")]
        folders: Vec<PathBuf>,

        #[arg(long)]
        dry_run: bool,
    },

    /// List existing test/code counterparts of the file
    Alternate {
        #[arg(long)]
        file: PathBuf,

        #[arg(long = "folder")]
        folders: Vec<PathBuf>,
    },

    /// Pull the selection out into a local variable and print the new buffer
    ExtractVariable {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        buffer: Option<PathBuf>,

        /// Selection start as a character offset
        #[arg(long)]
        start: usize,

        /// Selection end as a character offset (exclusive)
        #[arg(long)]
        end: usize,

        /// Name of the new variable
        #[arg(long)]
        name: String,
    },

    /// Print recent runs and pass/fail totals
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

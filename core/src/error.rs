use std::path::PathBuf;

use thiserror::Error;

use crate::file_kind::Capability;

pub type Result<T> = std::result::Result<T, RubyTestError>;

#[derive(Debug, Error)]
pub enum RubyTestError {
    /// No matcher found a test definition above the cursor.
    #[error("No test name found above the cursor")]
    NoTestNameFound,

    #[error("{}", unsupported_message(.capability, .file_name))]
    UnsupportedFileKind {
        file_name: String,
        capability: Capability,
    },

    #[error("could not find {candidates:?}")]
    NoAlternateFileFound { candidates: Vec<String> },

    #[error("No previous test run recorded")]
    NoLastRun,

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Failed to load settings from {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

fn unsupported_message(capability: &Capability, file_name: &str) -> String {
    match capability {
        Capability::RunTest => "Only *_test.rb, *_spec.rb, *.feature files supported!".to_string(),
        Capability::VerifySyntax => "Only .rb, .erb or .haml files supported!".to_string(),
        Capability::SwitchToTest => {
            format!("No test/code counterpart convention for {file_name}")
        }
        other => format!("{} is not available for {file_name}", other.as_str()),
    }
}

//! User settings, read once and passed by reference to everything that needs
//! them. The file is JSON; every key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RubyTestError};
use crate::file_kind::{FileKind, TemplateKind};
use crate::window::DEFAULT_WINDOW_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ruby_unit_folder: String,
    pub ruby_rspec_folder: String,
    pub ruby_cucumber_folder: String,

    pub run_ruby_unit_command: String,
    pub run_single_ruby_unit_command: String,
    pub run_rspec_command: String,
    pub run_single_rspec_command: String,
    pub run_cucumber_command: String,
    pub run_single_cucumber_command: String,

    pub ruby_verify_command: String,
    pub erb_verify_command: String,
    pub haml_verify_command: String,

    /// Prepended to every command, e.g. `bundle exec`.
    pub command_prefix: Option<String>,
    /// Run through the shell before the command.
    pub before_callback: Option<String>,
    /// Appended as `; <after_callback>`.
    pub after_callback: Option<String>,

    pub ignored_directories: Vec<String>,
    pub window_size: usize,
    pub show_progress: bool,
    pub save_on_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ruby_unit_folder: "test".to_string(),
            ruby_rspec_folder: "spec".to_string(),
            ruby_cucumber_folder: "features".to_string(),
            run_ruby_unit_command: "ruby -Itest {relative_path}".to_string(),
            run_single_ruby_unit_command: "ruby -Itest {relative_path} -n '{test_name}'"
                .to_string(),
            run_rspec_command: "rspec {relative_path}".to_string(),
            run_single_rspec_command: "rspec {relative_path} -l {line_number}".to_string(),
            run_cucumber_command: "cucumber {relative_path}".to_string(),
            run_single_cucumber_command: "cucumber {relative_path} -l {line_number}".to_string(),
            ruby_verify_command: "ruby -c {file_name}".to_string(),
            erb_verify_command: "erb -xT - {file_name} | ruby -c".to_string(),
            haml_verify_command: "haml -c {file_name}".to_string(),
            command_prefix: None,
            before_callback: None,
            after_callback: None,
            ignored_directories: [".git", "vendor", "tmp", "log", "node_modules"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            window_size: DEFAULT_WINDOW_SIZE,
            show_progress: true,
            save_on_run: false,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON file. The file must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| RubyTestError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit` if given, else from the user config file if it
    /// exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading settings");
            return Self::from_file(path);
        }
        match default_settings_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "loading settings");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Test root folder name the runner for `kind` expects.
    pub fn partition_folder(&self, kind: FileKind) -> Option<&str> {
        match kind {
            FileKind::UnitTest => Some(&self.ruby_unit_folder),
            FileKind::RSpec => Some(&self.ruby_rspec_folder),
            FileKind::CucumberFeature => Some(&self.ruby_cucumber_folder),
            _ => None,
        }
    }

    pub fn verify_template(&self, kind: FileKind) -> Option<&str> {
        match kind {
            FileKind::RubySource
            | FileKind::UnitTest
            | FileKind::RSpec
            | FileKind::CucumberSteps => Some(&self.ruby_verify_command),
            FileKind::Template(TemplateKind::Erb) => Some(&self.erb_verify_command),
            FileKind::Template(TemplateKind::Haml) => Some(&self.haml_verify_command),
            FileKind::CucumberFeature | FileKind::Unclassified => None,
        }
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rubytest").join("settings.json"))
}

pub fn default_state_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("rubytest"))
}

use serde::{Deserialize, Serialize};

use crate::command::CommandSpec;
use crate::file_kind::{Capability, FileKind};
use crate::matcher::{Matcher, TestName};

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyResponse {
    pub file_path: String,
    pub file_kind: FileKind,
    pub capabilities: Vec<Capability>,
    /// Counterpart file names by convention, whether or not they exist.
    pub alternates: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestNameResponse {
    pub file_path: String,
    pub file_kind: FileKind,
    /// Set for test-unit files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_name: Option<TestName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<Matcher>,
    /// 1-based cursor line, used by RSpec and Cucumber.
    pub line_number: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlternatesResponse {
    pub file_path: String,
    pub candidates: Vec<String>,
    pub found: Vec<String>,
}

/// What a run command would execute, printed for `--dry-run`.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedRun {
    pub kind: RunKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub before_callback: Option<String>,
    /// Adapter should save open buffers before running.
    pub save_on_run: bool,
    pub command: CommandSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    SingleTest,
    AllTests,
    VerifySyntax,
    LastTest,
    RailsGenerate,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::SingleTest => "single_test",
            RunKind::AllTests => "all_tests",
            RunKind::VerifySyntax => "verify_syntax",
            RunKind::LastTest => "last_test",
            RunKind::RailsGenerate => "rails_generate",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub kind: String,
    pub file_path: Option<String>,
    pub command: String,
    pub working_dir: String,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub started_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_runs: u32,
    pub passed: u32,
    pub failed: u32,
    pub avg_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub summary: HistorySummary,
    pub runs: Vec<RunRecord>,
}

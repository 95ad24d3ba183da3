use crate::command::CommandSpec;
use crate::error::Result;
use crate::persistence::{Database, NewRun};
use crate::runner::RunOutcome;
use crate::types::{HistoryResponse, RunKind};

/// Record an executed command: it becomes the last run and gets a history row.
/// A replay of the last run only adds the history row.
pub fn record_run(
    db: &Database,
    kind: RunKind,
    file_path: Option<&str>,
    spec: &CommandSpec,
    outcome: &RunOutcome,
) -> Result<i64> {
    if kind != RunKind::LastTest {
        db.save_last_run(spec)?;
    }
    let id = db.insert_run(&NewRun {
        kind,
        file_path,
        spec,
        exit_code: outcome.exit_code,
        duration_ms: outcome.duration.as_millis() as u64,
    })?;
    Ok(id)
}

/// The `limit` most recent runs plus totals over the whole history.
pub fn recent_runs(db: &Database, limit: usize) -> Result<HistoryResponse> {
    Ok(HistoryResponse {
        summary: db.history_summary()?,
        runs: db.recent_runs(limit)?,
    })
}

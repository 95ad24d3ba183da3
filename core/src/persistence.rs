use rusqlite::{Connection, params};
use std::path::Path;

use crate::command::CommandSpec;
use crate::types::{HistorySummary, RunKind, RunRecord};

/// One executed command, as written to `run_history`.
#[derive(Debug, Clone)]
pub struct NewRun<'a> {
    pub kind: RunKind,
    pub file_path: Option<&'a str>,
    pub spec: &'a CommandSpec,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a SQLite database at the given path.
    /// Uses WAL mode so an editor can read history while a run is recorded.
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;

        Ok(db)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        self.conn.execute_batch("PRAGMA busy_timeout=5000;")?;

        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS last_run (
                id          INTEGER PRIMARY KEY CHECK (id = 1),
                command     TEXT NOT NULL,
                working_dir TEXT NOT NULL,
                updated_at  DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS run_history (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                kind        TEXT NOT NULL,
                file_path   TEXT,
                command     TEXT NOT NULL,
                working_dir TEXT NOT NULL,
                exit_code   INTEGER,
                duration_ms INTEGER NOT NULL DEFAULT 0,
                started_at  DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_run_history_kind ON run_history(kind);",
        )?;
        Ok(())
    }

    /// Overwrite the single last-run row.
    pub fn save_last_run(&self, spec: &CommandSpec) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO last_run (id, command, working_dir, updated_at)
             VALUES (1, ?1, ?2, CURRENT_TIMESTAMP)",
            params![spec.shell_text, spec.working_directory],
        )?;
        Ok(())
    }

    /// The last command run, if any.
    pub fn last_run(&self) -> Result<Option<CommandSpec>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT command, working_dir FROM last_run WHERE id = 1")?;
        let result = stmt.query_row([], |row| {
            Ok(CommandSpec {
                shell_text: row.get(0)?,
                working_directory: row.get(1)?,
            })
        });
        match result {
            Ok(spec) => Ok(Some(spec)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn insert_run(&self, run: &NewRun<'_>) -> Result<i64, rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO run_history (kind, file_path, command, working_dir, exit_code, duration_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run.kind.as_str(),
                run.file_path,
                run.spec.shell_text,
                run.spec.working_directory,
                run.exit_code,
                run.duration_ms as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent runs first.
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, file_path, command, working_dir, exit_code, duration_ms, started_at
             FROM run_history ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(RunRecord {
                id: row.get(0)?,
                kind: row.get(1)?,
                file_path: row.get(2)?,
                command: row.get(3)?,
                working_dir: row.get(4)?,
                exit_code: row.get(5)?,
                duration_ms: row.get::<_, i64>(6)? as u64,
                started_at: row.get(7)?,
            })
        })?;
        rows.collect()
    }

    /// Aggregate pass/fail counts over the whole history.
    pub fn history_summary(&self) -> Result<HistorySummary, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT
                COUNT(*) as total_runs,
                COUNT(*) FILTER (WHERE exit_code = 0) as passed,
                COUNT(*) FILTER (WHERE exit_code IS NOT NULL AND exit_code != 0) as failed,
                COALESCE(AVG(duration_ms), 0.0) as avg_duration_ms
            FROM run_history",
        )?;

        stmt.query_row([], |row| {
            Ok(HistorySummary {
                total_runs: row.get::<_, i64>(0)? as u32,
                passed: row.get::<_, i64>(1)? as u32,
                failed: row.get::<_, i64>(2)? as u32,
                avg_duration_ms: row.get::<_, f64>(3)? as u64,
            })
        })
    }
}

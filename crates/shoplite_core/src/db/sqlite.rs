//! Embedded SQLite executor.
//!
//! # Responsibility
//! - Open and bootstrap file or in-memory SQLite databases.
//! - Translate compiled SQL text and result rows across the executor seam.
//!
//! # Invariants
//! - Returned executors have `foreign_keys=ON`, a busy timeout and all
//!   migrations applied.
//! - Transactions start with `BEGIN IMMEDIATE` so concurrent writers are
//!   serialized at transaction start.

use std::path::Path;
use std::time::{Duration, Instant};

use log::{error, info};
use rusqlite::Connection;

use super::migrations::apply_migrations;
use super::{DbResult, QueryExecutor, QueryOutcome, ResultSet, Row, SqlScalar};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    /// Opens a SQLite database file and applies all pending migrations.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=file");
        let conn = Connection::open(path)?;
        Self::bootstrapped(conn, "file", started_at)
    }

    /// Opens an in-memory SQLite database and applies all pending migrations.
    pub fn open_in_memory() -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=memory");
        let conn = Connection::open_in_memory()?;
        Self::bootstrapped(conn, "memory", started_at)
    }

    fn bootstrapped(mut conn: Connection, mode: &str, started_at: Instant) -> DbResult<Self> {
        match bootstrap(&mut conn) {
            Ok(()) => {
                info!(
                    "event=db_open module=db status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self { conn })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}

fn bootstrap(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}

impl QueryExecutor for SqliteExecutor {
    fn execute(&self, sql: &str) -> DbResult<QueryOutcome> {
        let mut stmt = self.conn.prepare(sql)?;
        if stmt.column_count() == 0 {
            stmt.execute([])?;
            return Ok(QueryOutcome::Statement(true));
        }

        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let mut rows = stmt.query([])?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next()? {
            let mut mapped = Row::new();
            for (index, name) in names.iter().enumerate() {
                let value: rusqlite::types::Value = row.get(index)?;
                mapped.insert(name.clone(), scalar_from(value));
            }
            collected.push(mapped);
        }
        Ok(QueryOutcome::Rows(ResultSet::from_rows(collected)))
    }

    fn last_insert_id(&self) -> DbResult<i64> {
        Ok(self.conn.last_insert_rowid())
    }

    fn begin(&self) -> DbResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        Ok(())
    }

    fn commit(&self) -> DbResult<()> {
        self.conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    fn rollback(&self) -> DbResult<()> {
        self.conn.execute_batch("ROLLBACK;")?;
        Ok(())
    }
}

fn scalar_from(value: rusqlite::types::Value) -> SqlScalar {
    match value {
        rusqlite::types::Value::Null => SqlScalar::Null,
        rusqlite::types::Value::Integer(v) => SqlScalar::Int(v),
        rusqlite::types::Value::Real(v) => SqlScalar::Real(v),
        rusqlite::types::Value::Text(v) => SqlScalar::Text(v),
        rusqlite::types::Value::Blob(v) => SqlScalar::Blob(v),
    }
}

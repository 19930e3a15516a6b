//! Storage driver core: error channel, row/scalar types, cursor contract
//! and the executor seam.
//!
//! # Responsibility
//! - Define the fatal error type shared by every storage operation.
//! - Define the generic row mapping (column name -> scalar value).
//! - Define the `QueryExecutor` trait the driver compiles statements for.
//!
//! # Invariants
//! - Validation failures never travel through `DbError`; they stay inside
//!   entity error maps. `DbError` is reserved for fatal/programming errors.
//! - `ResultSet::all` returns an empty list when there are no rows, never
//!   a null-like value.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod bind;
pub mod dialect;
pub mod driver;
pub mod migrations;
pub mod pool;
pub mod sqlite;

pub use dialect::Dialect;
pub use driver::DbDriver;
pub use pool::ConnectionPool;
pub use sqlite::SqliteExecutor;

pub type DbResult<T> = Result<T, DbError>;

/// Fatal storage and programming errors.
///
/// Everything here aborts the current operation; recoverable validation
/// failures are reported through entity error maps instead.
#[derive(Debug)]
pub enum DbError {
    Connect(String),
    Sqlite(rusqlite::Error),
    Backend {
        message: String,
    },
    /// Placeholder markers and supplied parameters disagree in count.
    Bind {
        markers: usize,
        params: usize,
    },
    TableName(String),
    NoColumns {
        table: String,
        operation: &'static str,
    },
    IdentifierRequired {
        operation: &'static str,
    },
    IdColumnRequired {
        table: String,
    },
    Pool(String),
    Decode(String),
    Misuse(String),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(message) => write!(f, "connection failed: {message}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Backend { message } => write!(f, "backend error: {message}"),
            Self::Bind { markers, params } => write!(
                f,
                "statement has {markers} bind markers but {params} parameters were supplied"
            ),
            Self::TableName(message) => write!(f, "{message}"),
            Self::NoColumns { table, operation } => {
                write!(f, "no columns supplied for {operation} on table `{table}`")
            }
            Self::IdentifierRequired { operation } => {
                write!(f, "identifier value is required for {operation}")
            }
            Self::IdColumnRequired { table } => write!(
                f,
                "identifier column name is required to insert into `{table}` on this backend"
            ),
            Self::Pool(message) => write!(f, "{message}"),
            Self::Decode(message) => write!(f, "invalid persisted data: {message}"),
            Self::Misuse(message) => write!(f, "{message}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// A positional statement parameter, escaped by the driver at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Rendered as a parenthesized tuple literal, element by element.
    List(Vec<SqlParam>),
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One column value as reported by a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlScalar {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlScalar {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Real(value) => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// A generic storage row: column name -> scalar value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: HashMap<String, SqlScalar>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: SqlScalar) {
        self.columns.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&SqlScalar> {
        self.columns.get(column)
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlScalar::as_int)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(SqlScalar::as_text)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Result cursor over the rows a statement produced.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// First row of the result, or `None` when the result is empty.
    pub fn row(mut self) -> Option<Row> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.rows.remove(0))
        }
    }

    /// Every row of the result. Empty when nothing matched, never null.
    pub fn all(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of one executed statement: either a no-result-set statement
/// acknowledgment or a cursor.
#[derive(Debug)]
pub enum QueryOutcome {
    Statement(bool),
    Rows(ResultSet),
}

impl QueryOutcome {
    pub fn succeeded(&self) -> bool {
        match self {
            Self::Statement(ok) => *ok,
            Self::Rows(_) => true,
        }
    }

    /// The cursor, or an empty one for statements without a result set.
    pub fn rows(self) -> ResultSet {
        match self {
            Self::Statement(_) => ResultSet::default(),
            Self::Rows(rows) => rows,
        }
    }

    pub fn row(self) -> Option<Row> {
        self.rows().row()
    }

    pub fn all(self) -> Vec<Row> {
        self.rows().all()
    }
}

/// Backend seam: executes already-compiled SQL text.
///
/// The driver compiles placeholders and escapes values before anything
/// reaches an executor, so implementations only transport statements and
/// translate results.
pub trait QueryExecutor {
    /// Establishes the underlying connection. Idempotent: re-invocation on
    /// a connected executor is a no-op.
    fn connect(&self) -> DbResult<()> {
        Ok(())
    }

    fn execute(&self, sql: &str) -> DbResult<QueryOutcome>;

    /// Backend-reported identifier of the most recent insert. Only consulted
    /// on dialects without a `RETURNING`-style clause.
    fn last_insert_id(&self) -> DbResult<i64>;

    fn begin(&self) -> DbResult<()>;

    fn commit(&self) -> DbResult<()>;

    fn rollback(&self) -> DbResult<()>;
}

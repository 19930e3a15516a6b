//! Backend statement dialects.
//!
//! # Responsibility
//! - Resolve the backend-specific pieces of statement compilation: boolean
//!   literals, identifier retrieval, row locking, offset-only pagination.
//!
//! # Invariants
//! - A dialect is chosen once at driver construction and never changes at
//!   runtime.

/// Statement dialect of the backend a driver compiles for.
///
/// `MySql` and `Postgres` are the wire dialects; `Sqlite` is the embedded
/// backend used by local deployments and the integration suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

/// How a freshly inserted row's identifier is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierRetrieval {
    /// Read the driver-reported last-insert-id after the insert.
    InsertId,
    /// Append a `RETURNING <id>` clause; requires the identifier column name.
    Returning,
}

impl Dialect {
    pub fn bool_literal(self, value: bool) -> &'static str {
        match self {
            Self::Postgres => {
                if value {
                    "TRUE"
                } else {
                    "FALSE"
                }
            }
            Self::MySql | Self::Sqlite => {
                if value {
                    "1"
                } else {
                    "0"
                }
            }
        }
    }

    pub fn identifier_retrieval(self) -> IdentifierRetrieval {
        match self {
            Self::Postgres => IdentifierRetrieval::Returning,
            Self::MySql | Self::Sqlite => IdentifierRetrieval::InsertId,
        }
    }

    /// Suffix appended to a single-row select that must take an exclusive
    /// row lock. Empty on SQLite, where immediate transactions already
    /// serialize writers.
    pub fn row_lock_clause(self) -> &'static str {
        match self {
            Self::MySql | Self::Postgres => " FOR UPDATE",
            Self::Sqlite => "",
        }
    }

    /// Pagination clause for an offset without a limit.
    pub fn offset_only_clause(self, offset: u64) -> String {
        match self {
            Self::MySql => format!("LIMIT 18446744073709551615 OFFSET {offset}"),
            Self::Postgres => format!("OFFSET {offset}"),
            Self::Sqlite => format!("LIMIT -1 OFFSET {offset}"),
        }
    }
}

//! Core data-access and validation layer for Shoplite.
//! This crate is the single source of truth for persistence invariants.

pub mod config;
pub mod db;
pub mod entity;
pub mod logging;
pub mod model;
pub mod property;
pub mod validate;

pub use config::{AppConfig, ConfigError, DatabaseConfig, LoggingConfig};
pub use db::{
    ConnectionPool, DbDriver, DbError, DbResult, Dialect, QueryExecutor, QueryOutcome, ResultSet,
    Row, SqlParam, SqlScalar, SqliteExecutor,
};
pub use entity::{Entity, EntityBase, Operation};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{Product, Purchase, User, ROLE_ADMIN, ROLE_CUSTOMER};
pub use property::{DisplayFormat, Input, Property, PropertyKind, Value};
pub use validate::{
    BelongsTo, Email, IdentifierSnapshot, MatchedWith, MoreOrEqual, MoreThan, NotZero, Range,
    Required, Rule, RuleCtx, Unique,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

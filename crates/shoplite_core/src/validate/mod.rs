//! Validation rule contract and evaluation context.
//!
//! # Responsibility
//! - Define the capability set every rule implements: check + message.
//! - Carry the read-only context rules may consult: the storage driver,
//!   the owning entity's identifier snapshot and peer property values.
//!
//! # Invariants
//! - Rules are stateless across invocations; the bound property is handed
//!   in by reference at check time and never mutated.
//! - Rules that need storage treat a missing driver handle as a fatal
//!   programming error, never as a validation failure.

mod rules;

pub use rules::{
    BelongsTo, Email, MatchedWith, MoreOrEqual, MoreThan, NotZero, Range, Required, Unique,
};

use std::fmt;

use crate::db::{DbDriver, DbError, DbResult, SqlParam};
use crate::property::{Property, Value};

/// One validation rule, bound to a property by the caller at check time.
pub trait Rule: fmt::Debug {
    /// Returns whether the subject passes. Storage-backed rules may fail
    /// fatally; ordinary rule failure is `Ok(false)`.
    fn check(&self, subject: &Property, ctx: &RuleCtx<'_>) -> DbResult<bool>;

    /// Deterministic, property-qualified failure message.
    fn message(&self, subject: &Property) -> String;
}

/// The owning entity's identifier at validation time.
///
/// `value` is `None` while the identifier is uninitialized; only that
/// explicit sentinel disables unique-exclusion, never a zero value.
#[derive(Debug, Clone)]
pub struct IdentifierSnapshot {
    pub column: String,
    pub value: Option<SqlParam>,
}

/// Read-only evaluation context handed to every rule.
pub struct RuleCtx<'a> {
    db: Option<&'a DbDriver>,
    identifier: Option<&'a IdentifierSnapshot>,
    peers: &'a [(String, Option<Value>)],
}

impl<'a> RuleCtx<'a> {
    pub fn new(
        db: Option<&'a DbDriver>,
        identifier: Option<&'a IdentifierSnapshot>,
        peers: &'a [(String, Option<Value>)],
    ) -> Self {
        Self {
            db,
            identifier,
            peers,
        }
    }

    /// Context without storage or peers, for standalone property checks.
    pub fn detached() -> RuleCtx<'static> {
        RuleCtx {
            db: None,
            identifier: None,
            peers: &[],
        }
    }

    pub fn db(&self) -> DbResult<&'a DbDriver> {
        self.db.ok_or_else(|| {
            DbError::Misuse("storage-backed rule evaluated without a database handle".to_string())
        })
    }

    pub fn identifier(&self) -> Option<&IdentifierSnapshot> {
        self.identifier
    }

    /// Current value of a sibling property, by name.
    pub fn peer(&self, name: &str) -> Option<&Option<Value>> {
        self.peers
            .iter()
            .find(|(peer, _)| peer == name)
            .map(|(_, value)| value)
    }
}

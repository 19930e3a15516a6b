//! The concrete rule set.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Rule, RuleCtx};
use crate::db::{DbError, DbResult};
use crate::property::{DisplayFormat, Property};

/// Fails when the property is empty per its kind's emptiness rule.
#[derive(Debug, Clone, Copy)]
pub struct Required;

impl Rule for Required {
    fn check(&self, subject: &Property, _ctx: &RuleCtx<'_>) -> DbResult<bool> {
        Ok(!subject.is_empty())
    }

    fn message(&self, subject: &Property) -> String {
        format!("{} is required", subject.display_title())
    }
}

/// Fails when the integer value is exactly zero.
#[derive(Debug, Clone, Copy)]
pub struct NotZero;

impl Rule for NotZero {
    fn check(&self, subject: &Property, _ctx: &RuleCtx<'_>) -> DbResult<bool> {
        Ok(subject.int() != Some(0))
    }

    fn message(&self, subject: &Property) -> String {
        format!("{} can't be equal zero", subject.display_title())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MoreThan {
    min: i64,
}

impl MoreThan {
    pub fn new(min: i64) -> Self {
        Self { min }
    }
}

impl Rule for MoreThan {
    fn check(&self, subject: &Property, _ctx: &RuleCtx<'_>) -> DbResult<bool> {
        Ok(subject.int().is_some_and(|value| value > self.min))
    }

    fn message(&self, subject: &Property) -> String {
        format!("{} must be greater than {}", subject.name(), self.min)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MoreOrEqual {
    min: i64,
}

impl MoreOrEqual {
    pub fn new(min: i64) -> Self {
        Self { min }
    }
}

impl Rule for MoreOrEqual {
    fn check(&self, subject: &Property, _ctx: &RuleCtx<'_>) -> DbResult<bool> {
        Ok(subject.int().is_some_and(|value| value >= self.min))
    }

    fn message(&self, subject: &Property) -> String {
        format!(
            "{} must be greater than or equal to {}",
            subject.name(),
            self.min
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Range {
    min: i64,
    max: i64,
}

impl Range {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl Rule for Range {
    fn check(&self, subject: &Property, _ctx: &RuleCtx<'_>) -> DbResult<bool> {
        Ok(subject
            .int()
            .is_some_and(|value| value >= self.min && value <= self.max))
    }

    fn message(&self, subject: &Property) -> String {
        format!(
            "{} is not in range [{}..{}]",
            subject.name(),
            self.min,
            self.max
        )
    }
}

/// Equality against another property of the same entity, by name.
#[derive(Debug, Clone)]
pub struct MatchedWith {
    peer: String,
}

impl MatchedWith {
    pub fn new(peer: impl Into<String>) -> Self {
        Self { peer: peer.into() }
    }
}

impl Rule for MatchedWith {
    fn check(&self, subject: &Property, ctx: &RuleCtx<'_>) -> DbResult<bool> {
        let peer_value = ctx.peer(&self.peer).ok_or_else(|| {
            DbError::Misuse(format!(
                "property `{}` compared against unknown peer `{}`",
                subject.name(),
                self.peer
            ))
        })?;
        Ok(subject.value() == peer_value.as_ref())
    }

    fn message(&self, subject: &Property) -> String {
        format!("{} does not match {}", subject.name(), self.peer)
    }
}

/// Fails when another row already holds the property's value.
///
/// The row matching the entity's identifier is excluded once the
/// identifier is initialized, so update-in-place keeps passing.
#[derive(Debug, Clone)]
pub struct Unique {
    table: String,
}

impl Unique {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

impl Rule for Unique {
    fn check(&self, subject: &Property, ctx: &RuleCtx<'_>) -> DbResult<bool> {
        let db = ctx.db()?;
        let mut sql = format!(
            "SELECT * FROM {} WHERE {} = ?",
            self.table,
            subject.name()
        );
        let mut params = vec![subject.prepared_for_db()];
        if let Some(identifier) = ctx.identifier() {
            if let Some(value) = &identifier.value {
                sql.push_str(&format!(" AND {} <> ?", identifier.column));
                params.push(value.clone());
            }
        }
        Ok(db.query(&sql, &params)?.row().is_none())
    }

    fn message(&self, subject: &Property) -> String {
        format!(
            "value '{}' is not unique for field `{}`",
            subject.as_string(DisplayFormat::Default),
            subject.name()
        )
    }
}

/// Foreign-key style check: the value must reference an existing row.
#[derive(Debug, Clone)]
pub struct BelongsTo {
    table: String,
    column: String,
}

impl BelongsTo {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl Rule for BelongsTo {
    fn check(&self, subject: &Property, ctx: &RuleCtx<'_>) -> DbResult<bool> {
        let db = ctx.db()?;
        let id = subject.prepared_for_db();
        Ok(db
            .get_entry(&self.table, (self.column.as_str(), &id))?
            .is_some())
    }

    fn message(&self, subject: &Property) -> String {
        format!(
            "{} does not reference {}",
            subject.as_string(DisplayFormat::Default),
            self.table
        )
    }
}

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("e-mail pattern is valid"));

#[derive(Debug, Clone, Copy)]
pub struct Email;

impl Rule for Email {
    fn check(&self, subject: &Property, _ctx: &RuleCtx<'_>) -> DbResult<bool> {
        Ok(subject.text().is_some_and(|value| EMAIL.is_match(value)))
    }

    fn message(&self, subject: &Property) -> String {
        format!(
            "{} is not a valid e-mail address",
            subject.as_string(DisplayFormat::Default)
        )
    }
}

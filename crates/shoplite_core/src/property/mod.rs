//! Typed entity properties.
//!
//! # Responsibility
//! - Define the single named, typed field every entity is built from:
//!   value, default, read-only flag and validator chain.
//! - Cast raw input to the declared kind on every `set`.
//!
//! # Invariants
//! - The uninitialized state is observably different from every valid
//!   value, including `0`, `""` and `false`. Presence checks go through
//!   `initialized()`, never through falsy-value heuristics.
//! - `is_valid` clears prior errors and retains one message per failing
//!   rule; failures never short-circuit the rest of the chain.

mod cast;
mod value;

pub use value::{Input, Value};

use crate::db::{DbResult, SqlParam};
use crate::validate::{Rule, RuleCtx};

/// Declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Integer,
    Text,
    Bool,
    /// Epoch seconds, stored as `Y-m-d`.
    Date,
    /// Seconds since midnight, stored as `H:M:S`.
    Time,
    /// Epoch seconds, stored as `Y-m-d H:M:S`.
    DateTime,
}

/// Rendering options for `Property::as_string`.
#[derive(Debug, Clone, Copy, Default)]
pub enum DisplayFormat<'a> {
    #[default]
    Default,
    /// A `time` format description; date-like kinds only.
    Pattern(&'a str),
    /// True/false labels; boolean kind only.
    Labels(&'a str, &'a str),
}

pub struct Property {
    name: String,
    title: Option<String>,
    kind: PropertyKind,
    value: Option<Value>,
    default: Option<Value>,
    read_only: bool,
    validators: Vec<Box<dyn Rule>>,
    errors: Vec<String>,
}

impl std::fmt::Debug for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("read_only", &self.read_only)
            .field("validators", &self.validators.len())
            .field("errors", &self.errors)
            .finish()
    }
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            title: None,
            kind,
            value: None,
            default: None,
            read_only: false,
            validators: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Sets the display label used in validation messages.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Configures the value adopted by `apply_default` when the property is
    /// still uninitialized at create time. The default is cast like any
    /// other input.
    pub fn use_as_default(mut self, default: impl Into<Input>) -> Self {
        self.default = cast::cast(self.kind, default.into());
        self
    }

    /// Marks the property read-only: excluded from writes and validation.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Appends a validation rule to the chain.
    pub fn validator(mut self, rule: impl Rule + 'static) -> Self {
        self.validators.push(Box::new(rule));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label, falling back to the property name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Casts and stores a raw value.
    pub fn set(&mut self, input: impl Into<Input>) -> &mut Self {
        self.value = cast::cast(self.kind, input.into());
        self
    }

    /// Returns the property to the uninitialized state.
    pub fn clear(&mut self) -> &mut Self {
        self.value = None;
        self
    }

    pub fn initialized(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn int(&self) -> Option<i64> {
        match self.value {
            Some(Value::Int(value)) => Some(value),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            Some(Value::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn bool(&self) -> Option<bool> {
        match self.value {
            Some(Value::Bool(value)) => Some(value),
            _ => None,
        }
    }

    /// Adopts the configured default when still uninitialized. Never
    /// overrides an explicitly set value.
    pub fn apply_default(&mut self) {
        if self.value.is_none() && self.default.is_some() {
            self.value = self.default.clone();
        }
    }

    /// Type-specific emptiness. Zero and the empty string count as empty
    /// but remain distinct from the uninitialized state.
    pub fn is_empty(&self) -> bool {
        match (&self.value, self.kind) {
            (None, _) => true,
            (Some(Value::Int(value)), _) => *value == 0,
            (Some(Value::Text(value)), _) => value.is_empty(),
            (Some(Value::Bool(_)), _) => false,
        }
    }

    /// Human-readable rendering.
    pub fn as_string(&self, format: DisplayFormat<'_>) -> String {
        let Some(value) = &self.value else {
            return String::new();
        };
        match (self.kind, value) {
            (PropertyKind::Integer, Value::Int(value)) => cast::group_digits(*value),
            (PropertyKind::Bool, Value::Bool(value)) => {
                let (truthy, falsy) = match format {
                    DisplayFormat::Labels(truthy, falsy) => (truthy, falsy),
                    _ => ("TRUE", "FALSE"),
                };
                let label = if *value { truthy } else { falsy };
                label.to_string()
            }
            (PropertyKind::Date | PropertyKind::Time | PropertyKind::DateTime, Value::Int(epoch)) => {
                let pattern = match format {
                    DisplayFormat::Pattern(pattern) => Some(pattern),
                    _ => None,
                };
                cast::format_stamp(self.kind, *epoch, pattern)
            }
            (_, Value::Text(value)) => value.clone(),
            (_, Value::Int(value)) => value.to_string(),
            (_, Value::Bool(value)) => value.to_string(),
        }
    }

    /// Storage-ready rendering for insert and update parameter maps.
    pub fn prepared_for_db(&self) -> SqlParam {
        let Some(value) = &self.value else {
            return SqlParam::Null;
        };
        match (self.kind, value) {
            (PropertyKind::Date | PropertyKind::Time | PropertyKind::DateTime, Value::Int(epoch)) => {
                SqlParam::Text(cast::db_stamp(self.kind, *epoch))
            }
            (_, Value::Int(value)) => SqlParam::Int(*value),
            (_, Value::Text(value)) => SqlParam::Text(value.clone()),
            (_, Value::Bool(value)) => SqlParam::Bool(*value),
        }
    }

    /// Clears prior errors, runs every bound rule and records one failure
    /// message per failing rule.
    pub fn is_valid(&mut self, ctx: &RuleCtx<'_>) -> DbResult<bool> {
        let mut failures = Vec::new();
        for rule in &self.validators {
            if !rule.check(self, ctx)? {
                failures.push(rule.message(self));
            }
        }
        self.errors = failures;
        Ok(self.errors.is_empty())
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

//! Value and input types shared by every property kind.

use crate::db::SqlScalar;

/// A typed, initialized property value.
///
/// Date-like kinds store epoch seconds in `Int`. The uninitialized state is
/// `Option::<Value>::None` on the owning property, observably distinct from
/// every variant here including `Int(0)`, `Text("")` and `Bool(false)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Text(String),
    Bool(bool),
}

/// Raw input accepted by `Property::set`, before type casting.
///
/// Covers both form-style text and typed row scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<i64> for Input {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Input {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Input {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Input>> From<Option<T>> for Input {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<&SqlScalar> for Input {
    fn from(value: &SqlScalar) -> Self {
        match value {
            SqlScalar::Null => Self::Null,
            SqlScalar::Int(v) => Self::Int(*v),
            SqlScalar::Real(v) => Self::Float(*v),
            SqlScalar::Text(v) => Self::Text(v.clone()),
            SqlScalar::Blob(_) => Self::Null,
        }
    }
}

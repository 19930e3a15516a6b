//! Type-specific casting and rendering helpers.
//!
//! # Invariants
//! - Casting never panics; input that cannot be interpreted for the target
//!   kind yields the uninitialized state so `Required` can report it.

use once_cell::sync::Lazy;
use time::format_description::{self, FormatItem};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

use super::value::{Input, Value};
use super::PropertyKind;

static DB_DATETIME: Lazy<Vec<FormatItem<'static>>> = Lazy::new(|| {
    format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .expect("datetime storage format is valid")
});

static DB_DATE: Lazy<Vec<FormatItem<'static>>> = Lazy::new(|| {
    format_description::parse("[year]-[month]-[day]").expect("date storage format is valid")
});

static DB_TIME: Lazy<Vec<FormatItem<'static>>> = Lazy::new(|| {
    format_description::parse("[hour]:[minute]:[second]").expect("time storage format is valid")
});

static DISPLAY_DATETIME: Lazy<Vec<FormatItem<'static>>> = Lazy::new(|| {
    format_description::parse("[day].[month].[year] [hour]:[minute]:[second]")
        .expect("datetime display format is valid")
});

static DISPLAY_DATE: Lazy<Vec<FormatItem<'static>>> = Lazy::new(|| {
    format_description::parse("[day].[month].[year]").expect("date display format is valid")
});

pub(crate) fn cast(kind: PropertyKind, input: Input) -> Option<Value> {
    match kind {
        PropertyKind::Integer => cast_integer(input),
        PropertyKind::Text => cast_text(input),
        PropertyKind::Bool => cast_bool(input),
        PropertyKind::Date | PropertyKind::Time | PropertyKind::DateTime => {
            cast_stamp(kind, input)
        }
    }
}

fn cast_integer(input: Input) -> Option<Value> {
    match input {
        Input::Null => None,
        Input::Int(value) => Some(Value::Int(value)),
        Input::Float(value) => Some(Value::Int(value as i64)),
        Input::Bool(value) => Some(Value::Int(i64::from(value))),
        Input::Text(text) => {
            if text.trim().is_empty() {
                None
            } else {
                Some(Value::Int(int_coerce(&text)))
            }
        }
    }
}

fn cast_text(input: Input) -> Option<Value> {
    match input {
        Input::Null => None,
        Input::Text(text) => Some(Value::Text(text)),
        Input::Int(value) => Some(Value::Text(value.to_string())),
        Input::Float(value) => Some(Value::Text(value.to_string())),
        Input::Bool(value) => Some(Value::Text(value.to_string())),
    }
}

fn cast_bool(input: Input) -> Option<Value> {
    match input {
        Input::Null => None,
        Input::Bool(value) => Some(Value::Bool(value)),
        Input::Int(value) => Some(Value::Bool(value != 0)),
        Input::Float(value) => Some(Value::Bool(value != 0.0)),
        Input::Text(text) => {
            if text.trim().is_empty() {
                None
            } else {
                Some(Value::Bool(bool_token(&text)))
            }
        }
    }
}

fn cast_stamp(kind: PropertyKind, input: Input) -> Option<Value> {
    match input {
        Input::Null | Input::Bool(_) => None,
        Input::Int(value) => Some(Value::Int(value)),
        Input::Float(value) => Some(Value::Int(value as i64)),
        Input::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(epoch) = trimmed.parse::<i64>() {
                return Some(Value::Int(epoch));
            }
            parse_stamp(kind, trimmed).map(Value::Int)
        }
    }
}

/// Leading-numeric coercion: optional sign, then a digit prefix; anything
/// else coerces to zero.
pub(crate) fn int_coerce(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<i64>().map(|value| sign * value).unwrap_or(0)
}

/// Truthy tokens recognized for boolean text input.
pub(crate) fn bool_token(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "1" | "on" | "t"
    )
}

fn parse_stamp(kind: PropertyKind, text: &str) -> Option<i64> {
    match kind {
        PropertyKind::DateTime => PrimitiveDateTime::parse(text, &*DB_DATETIME)
            .map(|moment| moment.assume_utc().unix_timestamp())
            .ok()
            .or_else(|| parse_stamp(PropertyKind::Date, text)),
        PropertyKind::Date => Date::parse(text, &*DB_DATE)
            .map(|date| date.midnight().assume_utc().unix_timestamp())
            .ok(),
        PropertyKind::Time => Time::parse(text, &*DB_TIME)
            .map(|clock| {
                i64::from(clock.hour()) * 3600
                    + i64::from(clock.minute()) * 60
                    + i64::from(clock.second())
            })
            .ok(),
        _ => None,
    }
}

/// Renders an epoch for display, with an optional caller-supplied format
/// description. A broken pattern falls back to the kind's default format.
pub(crate) fn format_stamp(kind: PropertyKind, epoch: i64, pattern: Option<&str>) -> String {
    let Ok(moment) = OffsetDateTime::from_unix_timestamp(epoch) else {
        return String::new();
    };
    if let Some(pattern) = pattern {
        if let Ok(items) = format_description::parse(pattern) {
            if let Ok(rendered) = moment.format(&items) {
                return rendered;
            }
        }
    }
    let items = match kind {
        PropertyKind::Date => &*DISPLAY_DATE,
        PropertyKind::Time => &*DB_TIME,
        _ => &*DISPLAY_DATETIME,
    };
    moment.format(items).unwrap_or_default()
}

/// Renders an epoch in the storage layout for the kind.
pub(crate) fn db_stamp(kind: PropertyKind, epoch: i64) -> String {
    let Ok(moment) = OffsetDateTime::from_unix_timestamp(epoch) else {
        return String::new();
    };
    let items = match kind {
        PropertyKind::Date => &*DB_DATE,
        PropertyKind::Time => &*DB_TIME,
        _ => &*DB_DATETIME,
    };
    moment.format(items).unwrap_or_default()
}

/// Thousands grouping for integer display.
pub(crate) fn group_digits(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

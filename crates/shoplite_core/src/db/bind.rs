//! Placeholder compilation and value escaping.
//!
//! # Responsibility
//! - Substitute `?` bind markers with escaped literals without ever
//!   touching marker characters inside single-quoted string spans.
//! - Render each parameter type as a backend-safe literal.
//!
//! # Invariants
//! - Marker/parameter count mismatches fail closed: the input text is
//!   returned unchanged and the driver refuses to execute it.
//! - Substitution runs from the last marker to the first so earlier byte
//!   offsets stay valid while the text grows.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Dialect, SqlParam};

pub(crate) const BIND_MARKER: char = '?';

static QUOTED_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new("'[^']*'").expect("quoted-span pattern is valid"));

static TABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("table-name pattern is valid"));

pub(crate) fn valid_table_name(name: &str) -> bool {
    TABLE_NAME.is_match(name)
}

/// Byte offsets of bind markers that sit outside single-quoted spans.
pub(crate) fn marker_offsets(sql: &str) -> Vec<usize> {
    let spans: Vec<(usize, usize)> = QUOTED_SPAN
        .find_iter(sql)
        .map(|span| (span.start(), span.end()))
        .collect();

    sql.match_indices(BIND_MARKER)
        .map(|(offset, _)| offset)
        .filter(|offset| {
            !spans
                .iter()
                .any(|(start, end)| *offset >= *start && *offset < *end)
        })
        .collect()
}

/// Renders one parameter as a literal for the given dialect.
pub(crate) fn escape(dialect: Dialect, param: &SqlParam) -> String {
    match param {
        SqlParam::Null => "NULL".to_string(),
        SqlParam::Int(value) => value.to_string(),
        SqlParam::Float(value) => value.to_string(),
        SqlParam::Bool(value) => dialect.bool_literal(*value).to_string(),
        SqlParam::Text(value) => quote_text(value),
        SqlParam::List(items) => {
            let rendered: Vec<String> = items.iter().map(|item| escape(dialect, item)).collect();
            format!("({})", rendered.join(","))
        }
    }
}

fn quote_text(value: &str) -> String {
    let stripped: String = value.chars().filter(|c| !is_invisible(*c)).collect();
    format!("'{}'", stripped.replace('\'', "''"))
}

/// Control characters other than tab, newline and carriage return.
fn is_invisible(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0b}' | '\u{0c}' | '\u{0e}'..='\u{1f}' | '\u{7f}')
}

/// Substitutes bind markers with escaped parameter literals.
///
/// Returns the input unchanged when there is nothing to substitute or when
/// the marker count outside quoted spans does not equal the parameter
/// count. Callers that supplied parameters must treat the latter as a
/// programming error; `DbDriver::query` rejects it before execution.
pub(crate) fn compile_bind(dialect: Dialect, sql: &str, params: &[SqlParam]) -> String {
    if params.is_empty() || !sql.contains(BIND_MARKER) {
        return sql.to_string();
    }

    let offsets = marker_offsets(sql);
    if offsets.len() != params.len() {
        return sql.to_string();
    }

    let mut compiled = sql.to_string();
    for (offset, param) in offsets.iter().zip(params.iter()).rev() {
        compiled.replace_range(
            *offset..offset + BIND_MARKER.len_utf8(),
            &escape(dialect, param),
        );
    }
    compiled
}

#[cfg(test)]
mod tests {
    use super::{compile_bind, escape, marker_offsets, valid_table_name};
    use crate::db::{Dialect, SqlParam};

    #[test]
    fn markers_inside_quoted_spans_are_ignored() {
        let sql = "SELECT * FROM t WHERE a = 'what?' AND b = ?";
        assert_eq!(marker_offsets(sql), vec![42]);

        let compiled = compile_bind(Dialect::MySql, sql, &[SqlParam::Int(7)]);
        assert_eq!(compiled, "SELECT * FROM t WHERE a = 'what?' AND b = 7");
    }

    #[test]
    fn mismatched_counts_fail_closed() {
        let sql = "SELECT * FROM t WHERE a = ? AND b = ?";
        let compiled = compile_bind(Dialect::MySql, sql, &[SqlParam::Int(1)]);
        assert_eq!(compiled, sql);
    }

    #[test]
    fn substitution_runs_from_last_to_first() {
        let sql = "INSERT INTO t (a,b,c) VALUES (?,?,?)";
        let params = [
            SqlParam::Text("it's".to_string()),
            SqlParam::Int(2),
            SqlParam::Bool(true),
        ];
        let compiled = compile_bind(Dialect::MySql, sql, &params);
        assert_eq!(compiled, "INSERT INTO t (a,b,c) VALUES ('it''s',2,1)");
        assert!(marker_offsets(&compiled).is_empty());
    }

    #[test]
    fn no_params_returns_text_unchanged() {
        let sql = "SELECT * FROM t WHERE a = ?";
        assert_eq!(compile_bind(Dialect::MySql, sql, &[]), sql);
    }

    #[test]
    fn list_params_render_as_tuple_literals() {
        let sql = "SELECT * FROM t WHERE id IN ?";
        let params = [SqlParam::List(vec![
            SqlParam::Int(1),
            SqlParam::Int(2),
            SqlParam::Text("x".to_string()),
        ])];
        let compiled = compile_bind(Dialect::MySql, sql, &params);
        assert_eq!(compiled, "SELECT * FROM t WHERE id IN (1,2,'x')");
    }

    #[test]
    fn escape_doubles_apostrophes_and_strips_control_characters() {
        let escaped = escape(
            Dialect::MySql,
            &SqlParam::Text("O'Hara\u{0}\u{1f}\ttail".to_string()),
        );
        assert_eq!(escaped, "'O''Hara\ttail'");
    }

    #[test]
    fn escape_renders_bools_and_null_per_dialect() {
        assert_eq!(escape(Dialect::MySql, &SqlParam::Bool(true)), "1");
        assert_eq!(escape(Dialect::Postgres, &SqlParam::Bool(false)), "FALSE");
        assert_eq!(escape(Dialect::Postgres, &SqlParam::Null), "NULL");
        assert_eq!(escape(Dialect::MySql, &SqlParam::Int(-5)), "-5");
    }

    #[test]
    fn table_names_are_validated() {
        assert!(valid_table_name("products"));
        assert!(valid_table_name("_staging_2"));
        assert!(!valid_table_name(""));
        assert!(!valid_table_name("products; DROP TABLE users"));
        assert!(!valid_table_name("1products"));
    }
}

//! Storage driver: CRUD primitives over a compiled-statement executor.
//!
//! # Responsibility
//! - Compile parameterized SQL against the configured dialect and hand the
//!   finished text to the executor.
//! - Provide the fixed CRUD primitives entities are built on.
//! - Trace every executed statement to the log sink.
//!
//! # Invariants
//! - Table names are validated before they are interpolated into SQL.
//! - A marker/parameter count mismatch is rejected before execution;
//!   unsubstituted SQL never reaches a backend.

use log::{debug, error};

use super::bind;
use super::dialect::IdentifierRetrieval;
use super::{DbError, DbResult, Dialect, QueryExecutor, QueryOutcome, ResultSet, Row, SqlParam};

pub struct DbDriver {
    exec: Box<dyn QueryExecutor>,
    dialect: Dialect,
}

impl DbDriver {
    pub fn new(exec: Box<dyn QueryExecutor>, dialect: Dialect) -> Self {
        Self { exec, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Establishes the backend connection. No-op when already connected.
    pub fn connect(&self) -> DbResult<()> {
        self.exec.connect()
    }

    /// Renders one parameter as a literal for this driver's dialect.
    pub fn escape(&self, param: &SqlParam) -> String {
        bind::escape(self.dialect, param)
    }

    /// Substitutes bind markers with escaped literals; fails closed by
    /// returning the input unchanged on a marker/parameter count mismatch.
    pub fn compile_bind(&self, sql: &str, params: &[SqlParam]) -> String {
        bind::compile_bind(self.dialect, sql, params)
    }

    /// Compiles and executes one statement.
    ///
    /// # Errors
    /// - `DbError::Bind` when the marker count outside quoted spans does not
    ///   equal `params.len()`; nothing is executed in that case.
    pub fn query(&self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutcome> {
        if !params.is_empty() {
            let markers = bind::marker_offsets(sql).len();
            if markers != params.len() {
                return Err(DbError::Bind {
                    markers,
                    params: params.len(),
                });
            }
        }
        let compiled = self.compile_bind(sql, params);
        self.run(&compiled)
    }

    fn run(&self, sql: &str) -> DbResult<QueryOutcome> {
        debug!("event=sql_exec module=db status=run sql={sql}");
        match self.exec.execute(sql) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!("event=sql_exec module=db status=error sql={sql} error={err}");
                Err(err)
            }
        }
    }

    /// Inserts a row and returns its generated identifier.
    ///
    /// On `RETURNING`-style dialects the identifier column name is
    /// mandatory; omitting it there is a programming error.
    pub fn create_entry(
        &self,
        table: &str,
        data: &[(String, SqlParam)],
        id_column: Option<&str>,
    ) -> DbResult<i64> {
        self.check_table_name(table, "create_entry")?;
        if data.is_empty() {
            return Err(DbError::NoColumns {
                table: table.to_string(),
                operation: "create_entry",
            });
        }

        let fields: Vec<&str> = data.iter().map(|(name, _)| name.as_str()).collect();
        let placeholders = vec!["?"; data.len()].join(",");
        let params: Vec<SqlParam> = data.iter().map(|(_, param)| param.clone()).collect();
        let insert = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            fields.join(",")
        );

        match self.dialect.identifier_retrieval() {
            IdentifierRetrieval::InsertId => {
                self.query(&insert, &params)?;
                self.exec.last_insert_id()
            }
            IdentifierRetrieval::Returning => {
                let id = id_column.ok_or_else(|| DbError::IdColumnRequired {
                    table: table.to_string(),
                })?;
                let sql = format!("{insert} RETURNING {id}");
                let row = self.query(&sql, &params)?.row().ok_or_else(|| DbError::Backend {
                    message: format!("insert into `{table}` returned no identifier row"),
                })?;
                row.int(id).ok_or_else(|| {
                    DbError::Decode(format!("identifier column `{id}` missing from returned row"))
                })
            }
        }
    }

    /// Updates the row matching a single-column identifier predicate.
    pub fn update_entry(
        &self,
        table: &str,
        data: &[(String, SqlParam)],
        id: (&str, &SqlParam),
    ) -> DbResult<bool> {
        self.check_table_name(table, "update_entry")?;
        if data.is_empty() {
            return Err(DbError::NoColumns {
                table: table.to_string(),
                operation: "update_entry",
            });
        }

        let assignments: Vec<String> = data
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect();
        let params: Vec<SqlParam> = data.iter().map(|(_, param)| param.clone()).collect();
        let sql = format!(
            "UPDATE {table} SET {} WHERE {} = {}",
            assignments.join(","),
            id.0,
            self.escape(id.1)
        );
        Ok(self.query(&sql, &params)?.succeeded())
    }

    /// Deletes the row matching a single-column identifier predicate.
    pub fn delete_entry(&self, table: &str, id: (&str, &SqlParam)) -> DbResult<bool> {
        self.check_table_name(table, "delete_entry")?;
        let sql = format!("DELETE FROM {table} WHERE {} = {}", id.0, self.escape(id.1));
        Ok(self.run(&sql)?.succeeded())
    }

    /// Selects the single row matching a single-column predicate.
    pub fn get_entry(&self, table: &str, id: (&str, &SqlParam)) -> DbResult<Option<Row>> {
        self.check_table_name(table, "get_entry")?;
        let sql = format!(
            "SELECT * FROM {table} WHERE {} = {}",
            id.0,
            self.escape(id.1)
        );
        Ok(self.run(&sql)?.row())
    }

    /// Lists rows from a table with optional ordering and pagination.
    pub fn entries(
        &self,
        table: &str,
        order_by: Option<&str>,
        limit: Option<u64>,
        offset: u64,
    ) -> DbResult<ResultSet> {
        self.check_table_name(table, "entries")?;
        let mut sql = format!("SELECT * FROM {table}");
        if let Some(order) = order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        match (limit, offset) {
            (Some(limit), 0) => sql.push_str(&format!(" LIMIT {limit}")),
            (Some(limit), offset) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (None, offset) if offset > 0 => {
                sql.push(' ');
                sql.push_str(&self.dialect.offset_only_clause(offset));
            }
            (None, _) => {}
        }
        Ok(self.run(&sql)?.rows())
    }

    /// Deletes every row from a table.
    pub fn clear_table(&self, table: &str) -> DbResult<bool> {
        self.check_table_name(table, "clear_table")?;
        let sql = format!("DELETE FROM {table}");
        Ok(self.run(&sql)?.succeeded())
    }

    pub fn begin(&self) -> DbResult<()> {
        debug!("event=tx module=db status=begin");
        self.exec.begin()
    }

    pub fn commit(&self) -> DbResult<()> {
        debug!("event=tx module=db status=commit");
        self.exec.commit()
    }

    pub fn rollback(&self) -> DbResult<()> {
        debug!("event=tx module=db status=rollback");
        self.exec.rollback()
    }

    fn check_table_name(&self, table: &str, operation: &'static str) -> DbResult<()> {
        if bind::valid_table_name(table) {
            Ok(())
        } else {
            Err(DbError::TableName(format!(
                "invalid table name `{table}` in {operation}"
            )))
        }
    }
}

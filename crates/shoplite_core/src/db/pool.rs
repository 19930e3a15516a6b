//! Named connection pool.
//!
//! # Responsibility
//! - Hold one driver per configured connection name, with at most one
//!   marked as the default.
//!
//! # Invariants
//! - The pool is an explicitly constructed value passed down to callers;
//!   there is no process-global registry.
//! - An empty lookup name resolves to the default connection, or to the
//!   sole entry when exactly one connection exists.

use super::{DbDriver, DbError, DbResult};

#[derive(Default)]
pub struct ConnectionPool {
    connections: Vec<(String, DbDriver)>,
    default_index: Option<usize>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a driver under a name; the last one added with
    /// `default = true` becomes the default connection.
    pub fn add(&mut self, name: impl Into<String>, driver: DbDriver, default: bool) {
        self.connections.push((name.into(), driver));
        if default {
            self.default_index = Some(self.connections.len() - 1);
        }
    }

    /// Resolves a connection by name; an empty name means the default.
    pub fn get(&self, name: &str) -> DbResult<&DbDriver> {
        if name.is_empty() {
            return self.default_connection();
        }
        self.connections
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, driver)| driver)
            .ok_or_else(|| DbError::Pool(format!("unknown database connection `{name}`")))
    }

    pub fn default_connection(&self) -> DbResult<&DbDriver> {
        if let Some(index) = self.default_index {
            return Ok(&self.connections[index].1);
        }
        if self.connections.len() == 1 {
            return Ok(&self.connections[0].1);
        }
        Err(DbError::Pool(
            "default database connection not configured".to_string(),
        ))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionPool;
    use crate::db::{DbDriver, DbError, Dialect, SqliteExecutor};

    fn memory_driver() -> DbDriver {
        let exec = SqliteExecutor::open_in_memory().expect("in-memory database should open");
        DbDriver::new(Box::new(exec), Dialect::Sqlite)
    }

    #[test]
    fn single_entry_acts_as_default() {
        let mut pool = ConnectionPool::new();
        pool.add("main", memory_driver(), false);

        assert!(pool.get("").is_ok());
        assert!(pool.get("main").is_ok());
    }

    #[test]
    fn explicit_default_wins_over_position() {
        let mut pool = ConnectionPool::new();
        pool.add("first", memory_driver(), false);
        pool.add("second", memory_driver(), true);

        let second = pool.get("second").unwrap();
        let resolved = pool.default_connection().unwrap();
        assert!(std::ptr::eq(second, resolved));
    }

    #[test]
    fn missing_default_and_unknown_names_are_errors() {
        let mut pool = ConnectionPool::new();
        pool.add("a", memory_driver(), false);
        pool.add("b", memory_driver(), false);

        assert!(matches!(pool.get(""), Err(DbError::Pool(_))));
        assert!(matches!(pool.get("missing"), Err(DbError::Pool(_))));
    }
}

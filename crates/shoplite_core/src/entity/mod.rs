//! Entity lifecycle orchestration.
//!
//! # Responsibility
//! - Hold an entity's table name, identifier property, ordered property
//!   registry and per-property error map.
//! - Drive the generic create/update/delete/select lifecycle and expose
//!   before/after hooks for entity-specific transactional logic.
//!
//! # Invariants
//! - Validation failures populate the error map and surface as `Ok(false)`;
//!   fatal conditions (missing identifier, storage faults) propagate as
//!   `Err(DbError)` and never as validation output.
//! - The identifier must hold a value before update, delete and
//!   select-by-id operations.
//! - On create every non-read-only property is validated; on update only
//!   properties explicitly re-set since load.

use crate::db::{DbDriver, DbError, DbResult, Row, SqlParam};
use crate::property::{Input, Property, Value};
use crate::validate::{IdentifierSnapshot, RuleCtx};

/// Which lifecycle operation a validation pass serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

/// Shared state backing every concrete entity type.
#[derive(Debug)]
pub struct EntityBase {
    table_name: String,
    identifier: Property,
    properties: Vec<Property>,
    errors: Vec<(String, Vec<String>)>,
}

impl EntityBase {
    pub fn new(table_name: impl Into<String>, identifier: Property) -> Self {
        Self {
            table_name: table_name.into(),
            identifier,
            properties: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Appends a property to the ordered registry. The identifier is kept
    /// separate and never appears here.
    pub fn add(&mut self, property: Property) {
        debug_assert!(
            self.property(property.name()).is_none(),
            "duplicate property name"
        );
        self.properties.push(property);
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn identifier(&self) -> &Property {
        &self.identifier
    }

    pub fn identifier_mut(&mut self) -> &mut Property {
        &mut self.identifier
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name() == name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    /// Casts raw values into matching properties; unknown names are
    /// ignored. Typical caller: a request boundary feeding form input.
    pub fn set_values<'v, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (&'v str, Input)>,
    {
        for (field, value) in values {
            if let Some(property) = self.property_mut(field) {
                property.set(value);
            }
        }
    }

    /// Hydrates the identifier and every name-matching property from a
    /// storage row. Properties without a corresponding column stay
    /// untouched.
    pub fn deploy_from_row(&mut self, row: &Row) {
        if let Some(scalar) = row.get(self.identifier.name()) {
            let input = Input::from(scalar);
            self.identifier.set(input);
        }
        for property in &mut self.properties {
            if let Some(scalar) = row.get(property.name()) {
                let input = Input::from(scalar);
                property.set(input);
            }
        }
    }

    pub fn apply_defaults(&mut self) {
        for property in &mut self.properties {
            property.apply_default();
        }
    }

    /// Column-value map for insert/update: initialized, writable
    /// properties only.
    pub fn db_params(&self) -> Vec<(String, SqlParam)> {
        self.properties
            .iter()
            .filter(|p| p.initialized() && !p.is_read_only())
            .map(|p| (p.name().to_string(), p.prepared_for_db()))
            .collect()
    }

    pub fn identifier_snapshot(&self) -> IdentifierSnapshot {
        IdentifierSnapshot {
            column: self.identifier.name().to_string(),
            value: self
                .identifier
                .initialized()
                .then(|| self.identifier.prepared_for_db()),
        }
    }

    /// Runs the validator chains appropriate for the operation and
    /// rebuilds the error map.
    pub fn validate(&mut self, operation: Operation, db: &DbDriver) -> DbResult<bool> {
        self.errors.clear();
        let snapshot = self.identifier_snapshot();
        let peers: Vec<(String, Option<Value>)> = self
            .properties
            .iter()
            .map(|p| (p.name().to_string(), p.value().cloned()))
            .collect();

        for index in 0..self.properties.len() {
            let run = {
                let property = &self.properties[index];
                !property.is_read_only()
                    && (operation == Operation::Create || property.initialized())
            };
            if !run {
                continue;
            }

            let ctx = RuleCtx::new(Some(db), Some(&snapshot), &peers);
            let property = &mut self.properties[index];
            if !property.is_valid(&ctx)? {
                let name = property.name().to_string();
                let messages = property.errors().to_vec();
                self.errors.push((name, messages));
            }
        }
        Ok(self.errors.is_empty())
    }

    /// Per-property validation failures, in property order.
    pub fn errors(&self) -> &[(String, Vec<String>)] {
        &self.errors
    }

    pub fn errors_for(&self, name: &str) -> &[String] {
        self.errors
            .iter()
            .find(|(property, _)| property == name)
            .map_or(&[], |(_, messages)| messages.as_slice())
    }

    /// Records failure messages for a property, replacing any previous
    /// entry under the same name.
    pub fn add_error(&mut self, name: impl Into<String>, messages: Vec<String>) {
        let name = name.into();
        if let Some(entry) = self.errors.iter_mut().find(|(property, _)| *property == name) {
            entry.1 = messages;
        } else {
            self.errors.push((name, messages));
        }
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn require_identifier(&self, operation: &'static str) -> DbResult<()> {
        if self.identifier.initialized() {
            Ok(())
        } else {
            Err(DbError::IdentifierRequired { operation })
        }
    }
}

/// The generic persistence lifecycle.
///
/// Concrete entities supply state access and may override the hooks to
/// layer extra invariants on top; `generic_before_*` bodies stay callable
/// from overrides that want to chain the stock behavior first.
pub trait Entity<'db> {
    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    fn db(&self) -> &'db DbDriver;

    fn generic_before_create(&mut self) -> DbResult<bool> {
        let db = self.db();
        let base = self.base_mut();
        base.apply_defaults();
        base.validate(Operation::Create, db)
    }

    fn before_create(&mut self) -> DbResult<bool> {
        self.generic_before_create()
    }

    fn after_create(&mut self) -> DbResult<bool> {
        Ok(true)
    }

    /// Inserts the entity and assigns the generated identifier.
    ///
    /// `Ok(false)` means a hook or validation rejected the entity; the
    /// error map tells why and storage was never touched.
    fn create(&mut self) -> DbResult<bool> {
        if !self.before_create()? {
            return Ok(false);
        }
        let db = self.db();
        let (table, data, id_column) = {
            let base = self.base();
            (
                base.table_name().to_string(),
                base.db_params(),
                base.identifier().name().to_string(),
            )
        };
        let id = db.create_entry(&table, &data, Some(&id_column))?;
        self.base_mut().identifier_mut().set(id);
        self.after_create()
    }

    fn generic_before_update(&mut self) -> DbResult<bool> {
        let db = self.db();
        self.base_mut().validate(Operation::Update, db)
    }

    fn before_update(&mut self) -> DbResult<bool> {
        self.generic_before_update()
    }

    fn after_update(&mut self) -> DbResult<bool> {
        Ok(true)
    }

    /// Persists the changed column map keyed by the identifier.
    fn update(&mut self) -> DbResult<bool> {
        self.base().require_identifier("update")?;
        if !self.before_update()? {
            return Ok(false);
        }
        let db = self.db();
        let base = self.base();
        let data = base.db_params();
        let id_param = base.identifier().prepared_for_db();
        db.update_entry(
            base.table_name(),
            &data,
            (base.identifier().name(), &id_param),
        )?;
        self.after_update()
    }

    fn before_delete(&mut self) -> DbResult<bool> {
        Ok(true)
    }

    fn after_delete(&mut self) -> DbResult<bool> {
        Ok(true)
    }

    fn delete(&mut self) -> DbResult<bool> {
        self.base().require_identifier("delete")?;
        if !self.before_delete()? {
            return Ok(false);
        }
        let db = self.db();
        let base = self.base();
        let id_param = base.identifier().prepared_for_db();
        db.delete_entry(base.table_name(), (base.identifier().name(), &id_param))?;
        self.after_delete()
    }

    /// Fetches this entity's storage row by identifier.
    fn get_entry(&self) -> DbResult<Option<Row>> {
        self.base().require_identifier("get_entry")?;
        let base = self.base();
        let id_param = base.identifier().prepared_for_db();
        self.db()
            .get_entry(base.table_name(), (base.identifier().name(), &id_param))
    }

    /// Fetches and hydrates; `Ok(false)` when no row matches.
    fn load(&mut self) -> DbResult<bool> {
        match self.get_entry()? {
            Some(row) => {
                self.base_mut().deploy_from_row(&row);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

//! User entity: registration and authentication.
//!
//! # Invariants
//! - `username` is unique, with the current row excluded on update.
//! - The password is validated in plain form (required + confirmation
//!   match) and digested only after validation passes.

use sha2::{Digest, Sha256};

use crate::db::{DbDriver, DbResult, SqlParam};
use crate::entity::{Entity, EntityBase};
use crate::property::{Property, PropertyKind};
use crate::validate::{MatchedWith, Range, Required, Unique};

pub const ROLE_ADMIN: i64 = 1;
pub const ROLE_CUSTOMER: i64 = 2;

pub struct User<'db> {
    db: &'db DbDriver,
    base: EntityBase,
}

impl<'db> User<'db> {
    pub fn new(db: &'db DbDriver) -> Self {
        let mut base = EntityBase::new(
            "users",
            Property::new("id", PropertyKind::Integer).title("Identifier"),
        );
        base.add(
            Property::new("username", PropertyKind::Text)
                .title("Username")
                .validator(Unique::new("users")),
        );
        base.add(
            Property::new("password", PropertyKind::Text)
                .title("Password")
                .validator(Required)
                .validator(MatchedWith::new("confirm_password")),
        );
        base.add(
            Property::new("confirm_password", PropertyKind::Text)
                .title("Password confirmation")
                .read_only(),
        );
        base.add(
            Property::new("role", PropertyKind::Integer)
                .title("Role")
                .use_as_default(ROLE_CUSTOMER)
                .validator(Range::new(ROLE_ADMIN, ROLE_CUSTOMER)),
        );
        Self { db, base }
    }

    /// Salted digest stored in the password column. The salt is derived
    /// from the username so the same password digests differently per
    /// account.
    pub fn password_digest(username: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(username.as_bytes());
        hasher.update(b"$");
        hasher.update(password.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }

    /// Looks the user up by username, hydrates this entity from the row
    /// and compares password digests.
    pub fn auth_verify(&mut self, username: &str, password: &str) -> DbResult<bool> {
        let row = self
            .db
            .query(
                "SELECT * FROM users WHERE username = ?",
                &[SqlParam::from(username)],
            )?
            .row();
        let Some(row) = row else {
            return Ok(false);
        };

        self.base.deploy_from_row(&row);
        let expected = Self::password_digest(username, password);
        Ok(row.text("password") == Some(expected.as_str()))
    }
}

impl<'db> Entity<'db> for User<'db> {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn db(&self) -> &'db DbDriver {
        self.db
    }

    fn before_create(&mut self) -> DbResult<bool> {
        if !self.generic_before_create()? {
            return Ok(false);
        }

        let digest = {
            let username = self
                .base
                .property("username")
                .and_then(Property::text)
                .unwrap_or_default();
            let password = self
                .base
                .property("password")
                .and_then(Property::text)
                .unwrap_or_default();
            Self::password_digest(username, password)
        };
        if let Some(password) = self.base.property_mut("password") {
            password.set(digest);
        }
        Ok(true)
    }
}

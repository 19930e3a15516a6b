//! Product entity.
//!
//! # Invariants
//! - `name` must be unique across the products table.
//! - `price` is strictly positive; `quantity` never goes negative.

use crate::db::DbDriver;
use crate::entity::{Entity, EntityBase};
use crate::property::{Property, PropertyKind};
use crate::validate::{MoreOrEqual, MoreThan, Unique};

pub struct Product<'db> {
    db: &'db DbDriver,
    base: EntityBase,
}

impl<'db> Product<'db> {
    pub fn new(db: &'db DbDriver) -> Self {
        let mut base = EntityBase::new(
            "products",
            Property::new("id", PropertyKind::Integer).title("Identifier"),
        );
        base.add(
            Property::new("name", PropertyKind::Text)
                .title("Name")
                .validator(Unique::new("products")),
        );
        base.add(
            Property::new("description", PropertyKind::Text)
                .title("Description")
                .use_as_default(""),
        );
        base.add(
            Property::new("price", PropertyKind::Integer)
                .title("Price")
                .validator(MoreThan::new(0)),
        );
        base.add(
            Property::new("quantity", PropertyKind::Integer)
                .title("Quantity")
                .validator(MoreOrEqual::new(0)),
        );
        Self { db, base }
    }
}

impl<'db> Entity<'db> for Product<'db> {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn db(&self) -> &'db DbDriver {
        self.db
    }
}

//! Purchase entity and the transactional stock-decrement flow.
//!
//! # Responsibility
//! - Record purchases with a price snapshot taken from the product row.
//! - Atomically check and decrement product stock so concurrent purchases
//!   can never oversell.
//!
//! # Invariants
//! - The stock check and the decrement happen inside one transaction, with
//!   the product row read under an exclusive row lock.
//! - Insufficient stock rolls the transaction back and surfaces as a
//!   validation failure, never as a fatal error.
//! - A transaction opened here is always rolled back before a fatal error
//!   propagates out of a hook.

use time::OffsetDateTime;

use crate::db::{DbDriver, DbError, DbResult, ResultSet, SqlParam};
use crate::entity::{Entity, EntityBase};
use crate::model::Product;
use crate::property::{Property, PropertyKind};
use crate::validate::{BelongsTo, MoreOrEqual};

pub struct Purchase<'db> {
    db: &'db DbDriver,
    base: EntityBase,
    /// Stock remaining after this purchase, captured under the row lock.
    product_rest: Option<i64>,
}

impl<'db> Purchase<'db> {
    pub fn new(db: &'db DbDriver) -> Self {
        let mut base = EntityBase::new(
            "purchase",
            Property::new("id", PropertyKind::Integer).title("Identifier"),
        );
        base.add(
            Property::new("user_id", PropertyKind::Integer)
                .title("User")
                .validator(BelongsTo::new("users", "id")),
        );
        base.add(
            Property::new("product_id", PropertyKind::Integer)
                .title("Product")
                .validator(BelongsTo::new("products", "id")),
        );
        base.add(
            Property::new("date", PropertyKind::DateTime)
                .title("Purchase date")
                .use_as_default(OffsetDateTime::now_utc().unix_timestamp()),
        );
        base.add(
            Property::new("price", PropertyKind::Integer)
                .title("Price")
                .use_as_default(0),
        );
        base.add(
            Property::new("quantity", PropertyKind::Integer)
                .title("Quantity")
                .validator(MoreOrEqual::new(1)),
        );
        base.add(Property::new("username", PropertyKind::Text).read_only());
        base.add(Property::new("product", PropertyKind::Text).read_only());
        Self {
            db,
            base,
            product_rest: None,
        }
    }

    /// Purchase listing joined with user and product names, ordered by
    /// date; optionally restricted to one user.
    pub fn listing(&self, user_id: Option<i64>) -> DbResult<ResultSet> {
        let mut sql = String::from(
            "SELECT purchase.*, username, products.name AS product \
             FROM purchase \
             INNER JOIN users ON purchase.user_id = users.id \
             INNER JOIN products ON purchase.product_id = products.id",
        );
        let mut params = Vec::new();
        if let Some(user) = user_id {
            sql.push_str(" WHERE users.id = ?");
            params.push(SqlParam::Int(user));
        }
        sql.push_str(" ORDER BY purchase.date");
        Ok(self.db.query(&sql, &params)?.rows())
    }

    /// Locks the product row, verifies stock and captures the price
    /// snapshot and the post-purchase remainder.
    fn reserve_stock(&mut self) -> DbResult<bool> {
        let product_id = self
            .base
            .property("product_id")
            .and_then(Property::int)
            .ok_or_else(|| {
                DbError::Misuse("purchase validated without an initialized product_id".to_string())
            })?;
        let quantity = self
            .base
            .property("quantity")
            .and_then(Property::int)
            .unwrap_or(0);

        let sql = format!(
            "SELECT * FROM products WHERE id = ?{}",
            self.db.dialect().row_lock_clause()
        );
        let row = self.db.query(&sql, &[SqlParam::Int(product_id)])?.row();
        let Some(row) = row else {
            self.base.add_error(
                "product_id",
                vec!["product no longer exists".to_string()],
            );
            return Ok(false);
        };

        let available = row.int("quantity").unwrap_or(0);
        if available < quantity {
            self.base.add_error(
                "quantity",
                vec!["insufficient stock for the requested quantity".to_string()],
            );
            return Ok(false);
        }

        if let Some(price) = row.int("price") {
            if let Some(property) = self.base.property_mut("price") {
                property.set(price);
            }
        }
        self.product_rest = Some(available - quantity);
        Ok(true)
    }

    /// Writes the decremented stock back through the product entity.
    fn cascade_stock(&mut self) -> DbResult<()> {
        let rest = self.product_rest.take().ok_or_else(|| {
            DbError::Misuse("purchase committed without a stock reservation".to_string())
        })?;
        let product_id = self
            .base
            .property("product_id")
            .and_then(Property::int)
            .ok_or_else(|| {
                DbError::Misuse("purchase committed without an initialized product_id".to_string())
            })?;

        let mut product = Product::new(self.db);
        product.base_mut().identifier_mut().set(product_id);
        if let Some(quantity) = product.base_mut().property_mut("quantity") {
            quantity.set(rest);
        }
        if !product.update()? {
            return Err(DbError::Misuse(
                "stock cascade update was rejected by validation".to_string(),
            ));
        }
        Ok(())
    }
}

impl<'db> Entity<'db> for Purchase<'db> {
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

        let db = self.db;
        db.begin()?;
        match self.reserve_stock() {
            Ok(true) => Ok(true),
            Ok(false) => {
                db.rollback()?;
                Ok(false)
            }
            Err(err) => {
                let _ = db.rollback();
                Err(err)
            }
        }
    }

    fn after_create(&mut self) -> DbResult<bool> {
        let db = self.db;
        match self.cascade_stock() {
            Ok(()) => {
                db.commit()?;
                Ok(true)
            }
            Err(err) => {
                let _ = db.rollback();
                Err(err)
            }
        }
    }
}

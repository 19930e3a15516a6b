use std::path::Path;
use std::sync::{Arc, Barrier};

use shoplite_core::{DbDriver, Dialect, Entity, Input, Product, Purchase, SqliteExecutor, User};

fn memory_driver() -> DbDriver {
    let exec = SqliteExecutor::open_in_memory().unwrap();
    DbDriver::new(Box::new(exec), Dialect::Sqlite)
}

fn file_driver(path: &Path) -> DbDriver {
    let exec = SqliteExecutor::open(path).unwrap();
    DbDriver::new(Box::new(exec), Dialect::Sqlite)
}

/// Creates one user and one product (price 10, stock 5); returns their ids.
fn seed(db: &DbDriver) -> (i64, i64) {
    let mut user = User::new(db);
    user.base_mut().set_values([
        ("username", Input::from("alice")),
        ("password", Input::from("pw")),
        ("confirm_password", Input::from("pw")),
    ]);
    assert!(user.create().unwrap());

    let mut product = Product::new(db);
    product.base_mut().set_values([
        ("name", Input::from("widget")),
        ("price", Input::from(10)),
        ("quantity", Input::from(5)),
    ]);
    assert!(product.create().unwrap());

    (
        user.base().identifier().int().unwrap(),
        product.base().identifier().int().unwrap(),
    )
}

fn filled_purchase<'db>(db: &'db DbDriver, user_id: i64, product_id: i64, quantity: i64) -> Purchase<'db> {
    let mut purchase = Purchase::new(db);
    purchase.base_mut().set_values([
        ("user_id", Input::from(user_id)),
        ("product_id", Input::from(product_id)),
        ("quantity", Input::from(quantity)),
    ]);
    purchase
}

fn stock_of(db: &DbDriver, product_id: i64) -> i64 {
    let mut product = Product::new(db);
    product.base_mut().identifier_mut().set(product_id);
    assert!(product.load().unwrap());
    product.base().property("quantity").unwrap().int().unwrap()
}

#[test]
fn purchase_decrements_stock_and_snapshots_the_price() {
    let driver = memory_driver();
    let (user_id, product_id) = seed(&driver);

    let mut purchase = filled_purchase(&driver, user_id, product_id, 3);
    assert!(purchase.create().unwrap());
    assert!(purchase.base().identifier().initialized());

    // price copied from the product row under the lock
    assert_eq!(purchase.base().property("price").unwrap().int(), Some(10));
    assert_eq!(stock_of(&driver, product_id), 2);

    let row = purchase.get_entry().unwrap().unwrap();
    assert_eq!(row.int("price"), Some(10));
    assert!(!row.text("date").unwrap_or("").is_empty());
}

#[test]
fn insufficient_stock_fails_validation_and_leaves_no_trace() {
    let driver = memory_driver();
    let (user_id, product_id) = seed(&driver);

    let mut purchase = filled_purchase(&driver, user_id, product_id, 9);
    assert!(!purchase.create().unwrap());
    let messages = purchase.base().errors_for("quantity");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("insufficient stock"));

    assert_eq!(stock_of(&driver, product_id), 5);
    assert!(driver.entries("purchase", None, None, 0).unwrap().is_empty());

    // the rolled-back transaction leaves the connection usable
    let mut retry = filled_purchase(&driver, user_id, product_id, 3);
    assert!(retry.create().unwrap());
    assert_eq!(stock_of(&driver, product_id), 2);
}

#[test]
fn listing_joins_usernames_and_product_names() {
    let driver = memory_driver();
    let (user_id, product_id) = seed(&driver);
    assert!(filled_purchase(&driver, user_id, product_id, 2)
        .create()
        .unwrap());

    let template = Purchase::new(&driver);
    let rows = template.listing(None).unwrap().all();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text("username"), Some("alice"));
    assert_eq!(rows[0].text("product"), Some("widget"));

    // join columns hydrate the read-only properties and stay out of writes
    let mut hydrated = Purchase::new(&driver);
    hydrated.base_mut().deploy_from_row(&rows[0]);
    assert_eq!(
        hydrated.base().property("username").unwrap().text(),
        Some("alice")
    );
    assert!(hydrated
        .base()
        .db_params()
        .iter()
        .all(|(name, _)| name != "username" && name != "product"));

    assert!(template.listing(Some(user_id + 1)).unwrap().is_empty());
}

#[test]
fn concurrent_purchases_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.db");

    let (user_id, product_id) = {
        let driver = file_driver(&path);
        seed(&driver)
    };

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let barrier = Arc::clone(&barrier);
        let path = path.clone();
        handles.push(std::thread::spawn(move || {
            let driver = file_driver(&path);
            let mut purchase = filled_purchase(&driver, user_id, product_id, 3);
            barrier.wait();
            let created = purchase.create().expect("purchase must not fail fatally");
            let insufficient = !purchase.base().errors_for("quantity").is_empty();
            (created, insufficient)
        }));
    }

    let results: Vec<(bool, bool)> = handles
        .into_iter()
        .map(|handle| handle.join().expect("purchase thread must not panic"))
        .collect();

    let successes = results.iter().filter(|(created, _)| *created).count();
    assert_eq!(successes, 1, "exactly one purchase may win the stock");
    assert!(
        results
            .iter()
            .any(|(created, insufficient)| !created && *insufficient),
        "the losing purchase must report insufficient stock"
    );

    let driver = file_driver(&path);
    assert_eq!(stock_of(&driver, product_id), 2);
    assert_eq!(driver.entries("purchase", None, None, 0).unwrap().len(), 1);
}

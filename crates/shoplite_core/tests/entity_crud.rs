use shoplite_core::{
    DbDriver, DbError, Dialect, Entity, Input, Product, Row, SqlScalar, SqliteExecutor,
};

fn memory_driver() -> DbDriver {
    let exec = SqliteExecutor::open_in_memory().unwrap();
    DbDriver::new(Box::new(exec), Dialect::Sqlite)
}

fn filled_product<'db>(db: &'db DbDriver, name: &str, price: i64, quantity: i64) -> Product<'db> {
    let mut product = Product::new(db);
    product.base_mut().set_values([
        ("name", Input::from(name)),
        ("price", Input::from(price)),
        ("quantity", Input::from(quantity)),
    ]);
    product
}

#[test]
fn create_assigns_identifier_and_persists_the_row() {
    let driver = memory_driver();
    let mut product = filled_product(&driver, "widget", 10, 5);

    assert!(product.create().unwrap());
    let id = product.base().identifier().int().expect("id should be set");
    assert!(id > 0);

    let row = product.get_entry().unwrap().expect("row should exist");
    assert_eq!(row.text("name"), Some("widget"));
    assert_eq!(row.int("price"), Some(10));
    assert_eq!(row.int("quantity"), Some(5));
}

#[test]
fn failing_rule_blocks_create_and_reports_one_message() {
    let driver = memory_driver();
    let mut product = filled_product(&driver, "widget", 0, 5);

    assert!(!product.create().unwrap());
    assert!(!product.base().identifier().initialized());
    assert_eq!(product.base().errors_for("price").len(), 1);

    let rows = driver.entries("products", None, None, 0).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn update_without_identifier_is_a_fatal_error() {
    let driver = memory_driver();
    let mut product = filled_product(&driver, "widget", 10, 5);

    let err = product.update().unwrap_err();
    assert!(matches!(err, DbError::IdentifierRequired { .. }));

    let err = product.delete().unwrap_err();
    assert!(matches!(err, DbError::IdentifierRequired { .. }));
}

#[test]
fn update_persists_changed_columns() {
    let driver = memory_driver();
    let mut product = filled_product(&driver, "widget", 10, 5);
    assert!(product.create().unwrap());
    let id = product.base().identifier().int().unwrap();

    product.base_mut().property_mut("price").unwrap().set(25);
    assert!(product.update().unwrap());

    let mut reloaded = Product::new(&driver);
    reloaded.base_mut().identifier_mut().set(id);
    assert!(reloaded.load().unwrap());
    assert_eq!(reloaded.base().property("price").unwrap().int(), Some(25));
    assert_eq!(
        reloaded.base().property("name").unwrap().text(),
        Some("widget")
    );
}

#[test]
fn delete_removes_the_row() {
    let driver = memory_driver();
    let mut product = filled_product(&driver, "widget", 10, 5);
    assert!(product.create().unwrap());
    let id = product.base().identifier().int().unwrap();

    assert!(product.delete().unwrap());

    let mut reloaded = Product::new(&driver);
    reloaded.base_mut().identifier_mut().set(id);
    assert!(!reloaded.load().unwrap());
}

#[test]
fn defaults_apply_once_and_never_override_explicit_values() {
    let driver = memory_driver();

    let mut plain = filled_product(&driver, "plain", 10, 5);
    assert!(plain.create().unwrap());
    let row = plain.get_entry().unwrap().unwrap();
    assert_eq!(row.text("description"), Some(""));

    let mut described = filled_product(&driver, "described", 10, 5);
    described
        .base_mut()
        .property_mut("description")
        .unwrap()
        .set("hand made");
    assert!(described.create().unwrap());
    let row = described.get_entry().unwrap().unwrap();
    assert_eq!(row.text("description"), Some("hand made"));
}

#[test]
fn hydration_matches_columns_by_name_and_ignores_the_rest() {
    let driver = memory_driver();
    let mut product = Product::new(&driver);

    let mut row = Row::new();
    row.insert("id", SqlScalar::Int(7));
    row.insert("name", SqlScalar::Text("imported".to_string()));
    row.insert("unrelated_column", SqlScalar::Text("noise".to_string()));
    product.base_mut().deploy_from_row(&row);

    assert_eq!(product.base().identifier().int(), Some(7));
    assert_eq!(product.base().property("name").unwrap().text(), Some("imported"));
    assert!(!product.base().property("price").unwrap().initialized());
}

#[test]
fn entries_supports_ordering_and_pagination() {
    let driver = memory_driver();
    for (name, price) in [("a", 1), ("b", 2), ("c", 3)] {
        assert!(filled_product(&driver, name, price, 1).create().unwrap());
    }

    let page = driver
        .entries("products", Some("name"), Some(2), 1)
        .unwrap()
        .all();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].text("name"), Some("b"));
    assert_eq!(page[1].text("name"), Some("c"));
}

#[test]
fn clear_table_empties_the_table() {
    let driver = memory_driver();
    assert!(filled_product(&driver, "widget", 10, 5).create().unwrap());

    assert!(driver.clear_table("products").unwrap());
    assert!(driver.entries("products", None, None, 0).unwrap().is_empty());
}

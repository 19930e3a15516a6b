use shoplite_core::{
    DbDriver, Dialect, Entity, Input, Product, Purchase, SqliteExecutor, User, ROLE_CUSTOMER,
};

fn memory_driver() -> DbDriver {
    let exec = SqliteExecutor::open_in_memory().unwrap();
    DbDriver::new(Box::new(exec), Dialect::Sqlite)
}

fn created_product<'db>(db: &'db DbDriver, name: &str) -> Product<'db> {
    let mut product = Product::new(db);
    product.base_mut().set_values([
        ("name", Input::from(name)),
        ("price", Input::from(10)),
        ("quantity", Input::from(5)),
    ]);
    assert!(product.create().unwrap());
    product
}

fn filled_user<'db>(db: &'db DbDriver, username: &str, password: &str, confirm: &str) -> User<'db> {
    let mut user = User::new(db);
    user.base_mut().set_values([
        ("username", Input::from(username)),
        ("password", Input::from(password)),
        ("confirm_password", Input::from(confirm)),
    ]);
    user
}

#[test]
fn unique_rejects_a_duplicate_value_on_create() {
    let driver = memory_driver();
    created_product(&driver, "gadget");

    let mut duplicate = Product::new(&driver);
    duplicate.base_mut().set_values([
        ("name", Input::from("gadget")),
        ("price", Input::from(10)),
        ("quantity", Input::from(5)),
    ]);

    assert!(!duplicate.create().unwrap());
    let messages = duplicate.base().errors_for("name");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("not unique"));
}

#[test]
fn unique_excludes_the_row_being_updated() {
    let driver = memory_driver();
    let mut product = created_product(&driver, "gadget");

    product.base_mut().property_mut("price").unwrap().set(30);
    assert!(product.update().unwrap());
}

#[test]
fn unique_still_blocks_collisions_with_other_rows_on_update() {
    let driver = memory_driver();
    created_product(&driver, "first");
    let mut second = created_product(&driver, "second");

    second.base_mut().property_mut("name").unwrap().set("first");
    assert!(!second.update().unwrap());
    assert!(!second.base().errors_for("name").is_empty());
}

#[test]
fn belongs_to_fails_when_the_referenced_rows_are_missing() {
    let driver = memory_driver();
    let mut purchase = Purchase::new(&driver);
    purchase.base_mut().set_values([
        ("user_id", Input::from(99)),
        ("product_id", Input::from(99)),
        ("quantity", Input::from(1)),
    ]);

    assert!(!purchase.create().unwrap());
    assert!(!purchase.base().errors_for("user_id").is_empty());
    assert!(!purchase.base().errors_for("product_id").is_empty());
}

#[test]
fn password_confirmation_must_match() {
    let driver = memory_driver();
    let mut user = filled_user(&driver, "alice", "s3cret", "different");

    assert!(!user.create().unwrap());
    let messages = user.base().errors_for("password");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("does not match"));
}

#[test]
fn password_is_digested_after_validation_and_verifiable() {
    let driver = memory_driver();
    let mut user = filled_user(&driver, "alice", "s3cret", "s3cret");
    assert!(user.create().unwrap());

    let row = user.get_entry().unwrap().unwrap();
    let stored = row.text("password").unwrap().to_string();
    assert_ne!(stored, "s3cret");
    assert_eq!(stored, User::password_digest("alice", "s3cret"));

    let mut login = User::new(&driver);
    assert!(login.auth_verify("alice", "s3cret").unwrap());
    assert_eq!(login.base().identifier().int(), user.base().identifier().int());

    let mut rejected = User::new(&driver);
    assert!(!rejected.auth_verify("alice", "wrong").unwrap());
    assert!(!rejected.auth_verify("nobody", "s3cret").unwrap());
}

#[test]
fn role_defaults_to_customer_and_is_range_checked() {
    let driver = memory_driver();
    let mut user = filled_user(&driver, "bob", "pw", "pw");
    assert!(user.create().unwrap());
    let row = user.get_entry().unwrap().unwrap();
    assert_eq!(row.int("role"), Some(ROLE_CUSTOMER));

    let mut out_of_range = filled_user(&driver, "carol", "pw", "pw");
    out_of_range.base_mut().property_mut("role").unwrap().set(5);
    assert!(!out_of_range.create().unwrap());
    assert!(!out_of_range.base().errors_for("role").is_empty());
}

#[test]
fn read_only_properties_are_skipped_by_validation_and_writes() {
    let driver = memory_driver();
    let mut user = filled_user(&driver, "dave", "pw", "pw");
    assert!(user.create().unwrap());

    // confirm_password never reaches storage
    let row = user.get_entry().unwrap().unwrap();
    assert!(row.get("confirm_password").is_none());
}

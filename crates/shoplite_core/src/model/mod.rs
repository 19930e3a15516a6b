//! Concrete storefront entities built on the generic lifecycle.

pub mod product;
pub mod purchase;
pub mod user;

pub use product::Product;
pub use purchase::Purchase;
pub use user::{User, ROLE_ADMIN, ROLE_CUSTOMER};

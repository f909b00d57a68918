//! Domain models for the storefront.
//!
//! These are the validated shapes handed from repositories to routes and
//! templates. Database row types stay private to `crate::db`.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod notification;
pub mod order;
pub mod session;
pub mod shift;
pub mod user;

pub use address::{Address, AddressInput};
pub use cart::{Cart, CartLine};
pub use catalog::{Category, Product, ProductCard, Review};
pub use notification::{NewNotification, Notification};
pub use order::{NewOrder, OrderDetail, OrderItem, OrderSummary, PlacedOrder, StatusStep};
pub use session::{CurrentUser, keys as session_keys};
pub use shift::{Shift, ShiftOption};
pub use user::User;

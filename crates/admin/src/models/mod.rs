//! Domain models for the admin panel.
//!
//! Repositories map private row types into these; routes and templates only
//! see the validated shapes.

pub mod admin_user;
pub mod catalog;
pub mod dashboard;
pub mod driver;
pub mod order;
pub mod session;
pub mod shift;

pub use admin_user::AdminUser;
pub use catalog::{
    Category, CategoryInput, LOW_STOCK_THRESHOLD, Product, ProductFilter, ProductInput,
    ProductListItem, ProductStatusFilter, Supplier,
};
pub use dashboard::{DashboardMetrics, store_day_start};
pub use driver::{Driver, DriverInput};
pub use order::{
    AddressView, AssignedDriver, CustomerNotice, OrderDetail, OrderFilter, OrderItem,
    OrderListItem,
};
pub use session::{CurrentAdmin, keys as session_keys};
pub use shift::{Shift, ShiftInput};

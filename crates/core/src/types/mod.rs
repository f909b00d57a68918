//! Core types for Dukkan.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod location;
pub mod money;
pub mod order_number;
pub mod pagination;
pub mod person;
pub mod rating;
pub mod shift;
pub mod status;
pub mod validation;

pub use email::{Email, EmailError};
pub use id::*;
pub use location::{GeoPoint, LocationError, extract_coordinates};
pub use money::{Money, OrderTotals};
pub use order_number::{OrderNumber, OrderNumberError};
pub use pagination::Page;
pub use person::{FullName, NameError, PhoneError, PhoneNumber};
pub use rating::{Rating, RatingError};
pub use shift::{ShiftStatus, ShiftWindow, ShiftWindowError, store_local_time};
pub use status::*;
pub use validation::{FieldError, ValidationErrors};

//! Reusable view configuration shared by admin pages.

pub mod data_table;
pub mod sidebar;

pub use data_table::{DataTableConfig, FilterOption, TableColumn, TableFilter};
pub use sidebar::{ADMIN_MENU, MenuItem, MenuSection};

//! Data table component types.
//!
//! A list page describes its columns and filter bar with a
//! `DataTableConfig`; `partials/data_table_filters.html` renders the filter
//! form as a plain GET form so filtered views stay linkable.

use dukkan_core::OrderStatus;

use crate::models::{Category, OrderFilter, ProductFilter, ProductStatusFilter};

/// Column definition for a data table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub key: &'static str,
    pub label: &'static str,
    /// Right-align numeric columns.
    pub numeric: bool,
}

impl TableColumn {
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            numeric: false,
        }
    }

    #[must_use]
    pub const fn numeric(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            numeric: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    Text,
    Select,
    Checkbox,
}

/// Option for select filters.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Filter definition, carrying the value currently applied.
#[derive(Debug, Clone)]
pub struct TableFilter {
    /// Query-string parameter name.
    pub key: &'static str,
    pub label: &'static str,
    pub filter_type: FilterType,
    pub placeholder: &'static str,
    pub options: Vec<FilterOption>,
    /// Current value; `"1"` for a checked checkbox.
    pub value: String,
}

impl TableFilter {
    #[must_use]
    pub fn text(key: &'static str, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            key,
            label,
            filter_type: FilterType::Text,
            placeholder,
            options: vec![],
            value: String::new(),
        }
    }

    /// A select filter. The first rendered option is always "All" with an
    /// empty value.
    #[must_use]
    pub fn select(key: &'static str, label: &'static str, options: Vec<FilterOption>) -> Self {
        Self {
            key,
            label,
            filter_type: FilterType::Select,
            placeholder: "",
            options,
            value: String::new(),
        }
    }

    #[must_use]
    pub fn checkbox(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            filter_type: FilterType::Checkbox,
            placeholder: "",
            options: vec![],
            value: String::new(),
        }
    }

    /// Set the currently applied value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.filter_type == FilterType::Text
    }

    #[must_use]
    pub fn is_select(&self) -> bool {
        self.filter_type == FilterType::Select
    }

    #[must_use]
    pub fn is_checkbox(&self) -> bool {
        self.filter_type == FilterType::Checkbox
    }

    #[must_use]
    pub fn is_selected(&self, option: &FilterOption) -> bool {
        self.value == option.value
    }

    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.value == "1"
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone)]
pub struct DataTableConfig {
    pub table_id: &'static str,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    pub empty_title: &'static str,
    pub empty_description: Option<&'static str>,
}

impl DataTableConfig {
    #[must_use]
    pub const fn new(table_id: &'static str) -> Self {
        Self {
            table_id,
            columns: vec![],
            filters: vec![],
            empty_title: "No items found",
            empty_description: None,
        }
    }

    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub const fn empty_state(
        mut self,
        title: &'static str,
        description: Option<&'static str>,
    ) -> Self {
        self.empty_title = title;
        self.empty_description = description;
        self
    }

    /// Whether any filter currently narrows the list.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.filters.iter().any(|f| !f.value.is_empty())
    }
}

/// Build the products table configuration for the applied filter.
#[must_use]
pub fn products_table_config(categories: &[Category], filter: &ProductFilter) -> DataTableConfig {
    let category_options = categories
        .iter()
        .map(|c| FilterOption::new(c.id.as_i32().to_string(), c.name.clone()))
        .collect();

    let status_value = match filter.status {
        Some(ProductStatusFilter::Active) => "active",
        Some(ProductStatusFilter::Inactive) => "inactive",
        None => "",
    };

    DataTableConfig::new("products")
        .column(TableColumn::new("name", "Product"))
        .column(TableColumn::new("category", "Category"))
        .column(TableColumn::new("supplier", "Supplier"))
        .column(TableColumn::numeric("price", "Price"))
        .column(TableColumn::numeric("stock", "Stock"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::new("updated", "Updated"))
        .filter(
            TableFilter::text("q", "Search", "Search products by name...")
                .with_value(filter.search.clone().unwrap_or_default()),
        )
        .filter(
            TableFilter::select("category", "Category", category_options).with_value(
                filter
                    .category_id
                    .map(|id| id.as_i32().to_string())
                    .unwrap_or_default(),
            ),
        )
        .filter(
            TableFilter::select(
                "status",
                "Status",
                vec![
                    FilterOption::new("active", "Active"),
                    FilterOption::new("inactive", "Inactive"),
                ],
            )
            .with_value(status_value),
        )
        .filter(
            TableFilter::checkbox("low_stock", "Low stock only")
                .with_value(if filter.low_stock { "1" } else { "" }),
        )
        .empty_state(
            "No products found",
            Some("Try adjusting your search or filters"),
        )
}

/// Build the orders table configuration for the applied filter.
#[must_use]
pub fn orders_table_config(filter: &OrderFilter) -> DataTableConfig {
    let status_options = OrderStatus::ALL
        .iter()
        .map(|s| FilterOption::new(s.as_str(), s.label()))
        .collect();

    DataTableConfig::new("orders")
        .column(TableColumn::new("number", "Order"))
        .column(TableColumn::new("customer", "Customer"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::numeric("items", "Items"))
        .column(TableColumn::numeric("total", "Total"))
        .column(TableColumn::new("driver", "Driver"))
        .column(TableColumn::new("placed", "Placed"))
        .filter(
            TableFilter::text("q", "Order number", "Search by order number...")
                .with_value(filter.search.clone().unwrap_or_default()),
        )
        .filter(
            TableFilter::select("status", "Status", status_options).with_value(
                filter
                    .status
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
            ),
        )
        .empty_state("No orders found", None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfiltered_orders_config() {
        let config = orders_table_config(&OrderFilter::default());
        assert!(!config.is_filtered());
        let status = config.filters.iter().find(|f| f.key == "status");
        assert_eq!(
            status.map(|f| f.options.len()),
            Some(OrderStatus::ALL.len())
        );
    }

    #[test]
    fn test_applied_order_status_is_selected() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Delivered),
            search: None,
        };
        let config = orders_table_config(&filter);
        assert!(config.is_filtered());

        let status = config
            .filters
            .iter()
            .find(|f| f.is_select())
            .map(|f| {
                f.options
                    .iter()
                    .filter(|o| f.is_selected(o))
                    .map(|o| o.value.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        assert_eq!(status, vec![OrderStatus::Delivered.as_str().to_string()]);
    }

    #[test]
    fn test_low_stock_checkbox_reflects_filter() {
        let filter = ProductFilter {
            low_stock: true,
            ..ProductFilter::default()
        };
        let config = products_table_config(&[], &filter);
        let low_stock = config.filters.iter().find(|f| f.is_checkbox());
        assert!(low_stock.is_some_and(TableFilter::is_checked));
    }
}

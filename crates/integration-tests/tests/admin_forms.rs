//! Back-office forms, list filters and navigation.

use rust_decimal::Decimal;

use dukkan_admin::components::ADMIN_MENU;
use dukkan_admin::components::data_table::{orders_table_config, products_table_config};
use dukkan_admin::models::{Category, ProductStatusFilter, Supplier};
use dukkan_admin::routes::orders::OrderQuery;
use dukkan_admin::routes::products::{ProductForm, ProductQuery};
use dukkan_admin::routes::shifts::ShiftForm;
use dukkan_core::{CategoryId, Money, OrderStatus, SupplierId};

fn categories() -> Vec<Category> {
    vec![
        Category {
            id: CategoryId::new(1),
            slug: "dairy-eggs".to_string(),
            name: "الألبان والبيض".to_string(),
            image_url: None,
            position: 1,
            product_count: 12,
        },
        Category {
            id: CategoryId::new(2),
            slug: "bakery".to_string(),
            name: "المخبوزات".to_string(),
            image_url: None,
            position: 2,
            product_count: 0,
        },
    ]
}

fn suppliers() -> Vec<Supplier> {
    vec![Supplier {
        id: SupplierId::new(7),
        name: "Almarai".to_string(),
    }]
}

fn milk() -> ProductForm {
    ProductForm {
        category_id: "1".to_string(),
        supplier_id: "7".to_string(),
        slug: "fresh-milk-1l".to_string(),
        name: "حليب طازج ١ لتر".to_string(),
        price: "6.50".to_string(),
        stock: "120".to_string(),
        is_active: "on".to_string(),
        ..ProductForm::default()
    }
}

// =============================================================================
// Product form
// =============================================================================

#[test]
fn test_product_form_accepts_offered_choices() {
    let input = milk()
        .validate(&categories(), &suppliers())
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(input.category_id, CategoryId::new(1));
    assert_eq!(input.supplier_id, Some(SupplierId::new(7)));
    assert_eq!(input.price, Money::new(Decimal::new(650, 2)));
    assert!(input.is_active);
}

#[test]
fn test_product_form_rejects_unknown_references() {
    let form = ProductForm {
        category_id: "99".to_string(),
        supplier_id: "8".to_string(),
        ..milk()
    };
    let errors = form
        .validate(&categories(), &suppliers())
        .err()
        .unwrap_or_default();
    assert!(errors.has("category_id"));
    assert!(errors.has("supplier_id"));
}

#[test]
fn test_product_form_price_rules() {
    for price in ["-1", "6.505", "six", ""] {
        let form = ProductForm {
            price: price.to_string(),
            ..milk()
        };
        let errors = form
            .validate(&categories(), &suppliers())
            .err()
            .unwrap_or_default();
        assert!(errors.has("price"), "price {price:?} should be rejected");
    }

    let form = ProductForm {
        price: "6.500".to_string(),
        ..milk()
    };
    assert!(form.validate(&categories(), &suppliers()).is_ok());
}

#[test]
fn test_unchecked_box_deactivates() {
    let form = ProductForm {
        is_active: String::new(),
        supplier_id: String::new(),
        ..milk()
    };
    let input = form
        .validate(&categories(), &suppliers())
        .unwrap_or_else(|e| panic!("{e}"));
    assert!(!input.is_active);
    assert_eq!(input.supplier_id, None);
}

// =============================================================================
// List filters
// =============================================================================

#[test]
fn test_product_filters_survive_paging() {
    let query = ProductQuery {
        q: "milk".to_string(),
        category: "1".to_string(),
        status: "inactive".to_string(),
        low_stock: "1".to_string(),
        page: Some(3),
    };
    let filter = query.filter();
    assert_eq!(filter.status, Some(ProductStatusFilter::Inactive));
    assert!(filter.low_stock);
    assert_eq!(
        query.page_query(),
        "q=milk&category=1&status=inactive&low_stock=1&"
    );

    let table = products_table_config(&categories(), &filter);
    assert!(table.is_filtered());
    assert_eq!(table.filters.len(), 4);
}

#[test]
fn test_unfiltered_order_table_offers_every_status() {
    let query = OrderQuery::default();
    let table = orders_table_config(&query.filter());
    assert!(!table.is_filtered());

    let status = table
        .filters
        .iter()
        .find(|f| f.key == "status")
        .unwrap_or_else(|| panic!("status filter expected"));
    assert_eq!(status.options.len(), OrderStatus::ALL.len());
}

// =============================================================================
// Shifts and navigation
// =============================================================================

#[test]
fn test_shift_form_rejects_overnight_window() {
    let form = ShiftForm {
        name: "Night".to_string(),
        start: "22:00".to_string(),
        end: "01:00".to_string(),
        position: String::new(),
    };
    let errors = form.validate().err().unwrap_or_default();
    assert!(errors.has("end"));
}

#[test]
fn test_menu_highlights_one_item_per_page() {
    for path in ["/", "/orders/42", "/products/new", "/content/about"] {
        let active = ADMIN_MENU
            .iter()
            .flat_map(|section| section.items)
            .filter(|item| item.is_active(path))
            .count();
        assert_eq!(active, 1, "{path}");
    }
}

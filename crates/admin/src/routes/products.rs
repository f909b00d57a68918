//! Product management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use dukkan_core::{CategoryId, Money, Page, ProductId, SupplierId, ValidationErrors};

use crate::components::DataTableConfig;
use crate::components::data_table::products_table_config;
use crate::db::{CategoryRepository, DeleteOutcome, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::set_flash;
use crate::models::{
    Category, Product, ProductFilter, ProductInput, ProductListItem, ProductStatusFilter, Supplier,
};
use crate::routes::{PageContext, is_valid_slug, optional, parse_optional_i32, push_query};
use crate::state::AppState;

const PER_PAGE: u32 = 25;
const MAX_NAME_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 5000;

/// Product list query. Strings so that blank filter inputs are accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub q: String,
    pub category: String,
    pub status: String,
    pub low_stock: String,
    pub page: Option<u32>,
}

impl ProductQuery {
    #[must_use]
    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            search: optional(&self.q),
            category_id: parse_optional_i32(Some(&self.category)).map(CategoryId::new),
            status: ProductStatusFilter::parse(self.status.trim()),
            low_stock: !self.low_stock.is_empty(),
        }
    }

    /// Query string that preserves the filters across page links.
    #[must_use]
    pub fn page_query(&self) -> String {
        let filter = self.filter();
        let mut query = String::new();
        push_query(&mut query, "q", filter.search.as_deref().unwrap_or_default());
        push_query(
            &mut query,
            "category",
            &filter
                .category_id
                .map(|id| id.as_i32().to_string())
                .unwrap_or_default(),
        );
        push_query(
            &mut query,
            "status",
            match filter.status {
                Some(ProductStatusFilter::Active) => "active",
                Some(ProductStatusFilter::Inactive) => "inactive",
                None => "",
            },
        );
        if filter.low_stock {
            push_query(&mut query, "low_stock", "1");
        }
        query
    }
}

/// Raw product form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub category_id: String,
    pub supplier_id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub image_url: String,
    /// Checkbox; present when checked.
    pub is_active: String,
}

impl ProductForm {
    /// Validate against the categories and suppliers the form offered.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(
        &self,
        categories: &[Category],
        suppliers: &[Supplier],
    ) -> std::result::Result<ProductInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let category_id = parse_optional_i32(Some(&self.category_id))
            .map(CategoryId::new)
            .filter(|id| categories.iter().any(|c| c.id == *id));
        if category_id.is_none() {
            errors.add("category_id", "Choose a category");
        }

        let supplier_id = if self.supplier_id.trim().is_empty() {
            None
        } else {
            let id = parse_optional_i32(Some(&self.supplier_id))
                .map(SupplierId::new)
                .filter(|id| suppliers.iter().any(|s| s.id == *id));
            if id.is_none() {
                errors.add("supplier_id", "Unknown supplier");
            }
            id
        };

        let slug = self.slug.trim();
        if !is_valid_slug(slug) {
            errors.add(
                "slug",
                "Use lowercase letters, digits and hyphens, e.g. fresh-milk-1l",
            );
        }

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Name is required");
        } else if name.chars().count() > MAX_NAME_CHARS {
            errors.add("name", "Name is too long");
        }

        if self.description.trim().chars().count() > MAX_DESCRIPTION_CHARS {
            errors.add("description", "Description is too long");
        }

        let price = parse_price(&self.price);
        if price.is_none() {
            errors.add("price", "Enter a price such as 12.50");
        }

        let stock = self.stock.trim().parse::<i32>().ok().filter(|s| *s >= 0);
        if stock.is_none() {
            errors.add("stock", "Stock must be a whole number, zero or more");
        }

        let image_url = optional(&self.image_url);
        if image_url
            .as_deref()
            .is_some_and(|url| !(url.starts_with("https://") || url.starts_with('/')))
        {
            errors.add("image_url", "Use an https:// or site-relative image URL");
        }

        errors.into_result()?;
        match (category_id, price, stock) {
            (Some(category_id), Some(price), Some(stock)) => Ok(ProductInput {
                category_id,
                supplier_id,
                slug: slug.to_string(),
                name: name.to_string(),
                description: self.description.trim().to_string(),
                price,
                stock,
                image_url,
                is_active: !self.is_active.is_empty(),
            }),
            _ => Err(ValidationErrors::new()),
        }
    }
}

/// A non-negative amount with at most two decimal places.
fn parse_price(value: &str) -> Option<Money> {
    let amount: Decimal = value.trim().parse().ok()?;
    (!amount.is_sign_negative() && amount.normalize().scale() <= 2).then(|| Money::new(amount))
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            category_id: product.category_id.as_i32().to_string(),
            supplier_id: product
                .supplier_id
                .map(|id| id.as_i32().to_string())
                .unwrap_or_default(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            stock: product.stock.to_string(),
            image_url: product.image_url.clone().unwrap_or_default(),
            is_active: if product.is_active { "on" } else { "" }.to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub table: DataTableConfig,
    pub products: Vec<ProductListItem>,
    pub page: Page,
    pub total: i64,
    pub total_pages: u32,
    pub page_query: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub is_new: bool,
    pub form: ProductForm,
    pub errors: ValidationErrors,
    pub categories: Vec<Category>,
    pub suppliers: Vec<Supplier>,
}

impl ProductFormTemplate {
    /// Render with an error status.
    fn rejected(self, status: StatusCode) -> Response {
        (status, self).into_response()
    }
}

/// Product listing with filters.
///
/// # Errors
///
/// Returns an error if the products cannot be loaded.
#[instrument(skip(state, ctx, query))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.filter();
    let page = Page::new(query.page, PER_PAGE);

    let categories = CategoryRepository::new(state.pool()).list().await?;
    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;

    Ok(ProductsIndexTemplate {
        ctx,
        table: products_table_config(&categories, &filter),
        products,
        page,
        total,
        total_pages: page.total_pages(total),
        page_query: query.page_query(),
    })
}

async fn form_choices(state: &AppState) -> Result<(Vec<Category>, Vec<Supplier>)> {
    let categories = CategoryRepository::new(state.pool());
    Ok((categories.list().await?, categories.suppliers().await?))
}

/// Blank product form. New products start active.
///
/// # Errors
///
/// Returns an error if the categories cannot be loaded.
#[instrument(skip(state, ctx))]
pub async fn new_form(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let (categories, suppliers) = form_choices(&state).await?;
    Ok(ProductFormTemplate {
        ctx,
        action: "/products".to_string(),
        is_new: true,
        form: ProductForm {
            stock: "0".to_string(),
            is_active: "on".to_string(),
            ..ProductForm::default()
        },
        errors: ValidationErrors::new(),
        categories,
        suppliers,
    })
}

/// Create a product.
///
/// # Errors
///
/// Returns an error if the product cannot be saved.
#[instrument(skip(state, session, ctx, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let (categories, suppliers) = form_choices(&state).await?;
    let mut page = ProductFormTemplate {
        ctx,
        action: "/products".to_string(),
        is_new: true,
        form,
        errors: ValidationErrors::new(),
        categories,
        suppliers,
    };

    let input = match page.form.validate(&page.categories, &page.suppliers) {
        Ok(input) => input,
        Err(errors) => {
            page.errors = errors;
            return Ok(page.rejected(StatusCode::UNPROCESSABLE_ENTITY));
        }
    };

    match ProductRepository::new(state.pool()).create(&input).await {
        Ok(id) => {
            tracing::info!(product_id = %id, slug = %input.slug, "Product created");
            set_flash(&session, format!("Created {}", input.name)).await?;
            Ok(Redirect::to("/products").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            page.errors.add("slug", "This slug is already in use");
            Ok(page.rejected(StatusCode::CONFLICT))
        }
        Err(e) => Err(e.into()),
    }
}

/// Edit form.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
#[instrument(skip(state, ctx))]
pub async fn edit_form(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let (categories, suppliers) = form_choices(&state).await?;

    Ok(ProductFormTemplate {
        ctx,
        action: format!("/products/{id}"),
        is_new: false,
        form: ProductForm::from(&product),
        errors: ValidationErrors::new(),
        categories,
        suppliers,
    })
}

/// Save product changes.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
#[instrument(skip(state, session, ctx, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let (categories, suppliers) = form_choices(&state).await?;
    let mut page = ProductFormTemplate {
        ctx,
        action: format!("/products/{id}"),
        is_new: false,
        form,
        errors: ValidationErrors::new(),
        categories,
        suppliers,
    };

    let input = match page.form.validate(&page.categories, &page.suppliers) {
        Ok(input) => input,
        Err(errors) => {
            page.errors = errors;
            return Ok(page.rejected(StatusCode::UNPROCESSABLE_ENTITY));
        }
    };

    match ProductRepository::new(state.pool()).update(id, &input).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product updated");
            set_flash(&session, format!("Saved {}", input.name)).await?;
            Ok(Redirect::to("/products").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            page.errors.add("slug", "This slug is already in use");
            Ok(page.rejected(StatusCode::CONFLICT))
        }
        Err(e) => Err(e.into()),
    }
}

/// Show or hide a product in the storefront.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let id = ProductId::new(id);
    let active = ProductRepository::new(state.pool())
        .toggle_active(id)
        .await?;
    tracing::info!(product_id = %id, active, "Product visibility changed");
    set_flash(
        &session,
        if active {
            "Product is now visible in the store"
        } else {
            "Product is now hidden from the store"
        },
    )
    .await?;
    Ok(Redirect::to("/products"))
}

/// Delete a product. Products with order history are deactivated instead so
/// past orders keep their lines.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let id = ProductId::new(id);
    let outcome = ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(product_id = %id, ?outcome, "Product delete requested");

    let message = match outcome {
        DeleteOutcome::Deleted => "Product deleted",
        DeleteOutcome::Deactivated => {
            "Product has past orders, so it was deactivated instead of deleted"
        }
    };
    set_flash(&session, message).await?;
    Ok(Redirect::to("/products"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        vec![Category {
            id: CategoryId::new(3),
            slug: "dairy".to_string(),
            name: "Dairy".to_string(),
            image_url: None,
            position: 0,
            product_count: 0,
        }]
    }

    fn form() -> ProductForm {
        ProductForm {
            category_id: "3".to_string(),
            slug: "fresh-milk-1l".to_string(),
            name: " Fresh milk 1L ".to_string(),
            price: "6.50".to_string(),
            stock: "40".to_string(),
            is_active: "on".to_string(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_valid_product() {
        let input = form()
            .validate(&categories(), &[])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(input.name, "Fresh milk 1L");
        assert_eq!(input.price, Money::new(Decimal::new(650, 2)));
        assert_eq!(input.stock, 40);
        assert!(input.is_active);
        assert_eq!(input.supplier_id, None);
    }

    #[test]
    fn test_unknown_category_and_supplier_rejected() {
        let mut f = form();
        f.category_id = "99".to_string();
        f.supplier_id = "7".to_string();
        let errors = f.validate(&categories(), &[]).err().unwrap_or_default();
        assert!(errors.has("category_id"));
        assert!(errors.has("supplier_id"));
    }

    #[test]
    fn test_price_rules() {
        assert!(parse_price("12").is_some());
        assert!(parse_price("12.5").is_some());
        assert!(parse_price("12.500").is_some());
        assert!(parse_price("12.555").is_none());
        assert!(parse_price("-1").is_none());
        assert!(parse_price("free").is_none());
    }

    #[test]
    fn test_negative_stock_and_bad_slug_rejected() {
        let mut f = form();
        f.stock = "-3".to_string();
        f.slug = "Fresh Milk".to_string();
        let errors = f.validate(&categories(), &[]).err().unwrap_or_default();
        assert!(errors.has("stock"));
        assert!(errors.has("slug"));
    }

    #[test]
    fn test_unchecked_box_means_inactive() {
        let mut f = form();
        f.is_active = String::new();
        assert_eq!(
            f.validate(&categories(), &[]).ok().map(|i| i.is_active),
            Some(false)
        );
    }

    #[test]
    fn test_query_blank_inputs_are_unset() {
        let query = ProductQuery {
            category: String::new(),
            status: "all".to_string(),
            ..ProductQuery::default()
        };
        assert_eq!(query.filter(), ProductFilter::default());
        assert_eq!(query.page_query(), "");
    }

    #[test]
    fn test_page_query_keeps_filters() {
        let query = ProductQuery {
            q: "milk".to_string(),
            category: "3".to_string(),
            low_stock: "1".to_string(),
            ..ProductQuery::default()
        };
        assert_eq!(query.page_query(), "q=milk&category=3&low_stock=1&");
    }
}

//! Catalog route handlers: categories, product pages and reviews.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use dukkan_core::{Page, Rating, ValidationErrors};

use crate::db::{CatalogRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Category, Product, ProductCard, Review};
use crate::routes::PageContext;
use crate::state::AppState;

/// Products per listing page.
pub const PER_PAGE: u32 = 12;

/// Longest review comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

/// A validated review submission.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidReview {
    pub rating: Rating,
    pub comment: Option<String>,
}

impl ReviewForm {
    /// # Errors
    ///
    /// Returns field errors for an out-of-range rating or an overlong comment.
    pub fn validate(&self) -> std::result::Result<ValidReview, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let rating = errors.check(
            "rating",
            self.rating
                .trim()
                .parse::<i64>()
                .map_err(|_| ())
                .and_then(|v| Rating::new(v).map_err(|_| ())),
            "يرجى اختيار تقييم من 1 إلى 5",
        );

        let comment = self.comment.trim();
        if comment.chars().count() > MAX_COMMENT_CHARS {
            errors.add("comment", "التعليق يجب ألا يتجاوز 1000 حرف");
        }

        match rating {
            Some(rating) if errors.is_empty() => Ok(ValidReview {
                rating,
                comment: (!comment.is_empty()).then(|| comment.to_string()),
            }),
            _ => Err(errors),
        }
    }
}

/// Category list template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub ctx: PageContext,
    pub categories: Arc<Vec<Category>>,
}

/// Category product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryTemplate {
    pub ctx: PageContext,
    pub category: Category,
    pub products: Vec<ProductCard>,
    pub page: Page,
    pub total_pages: u32,
    pub total: i64,
    pub page_query: String,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductTemplate {
    pub ctx: PageContext,
    pub product: Product,
    pub reviews: Vec<Review>,
    pub in_wishlist: bool,
    pub review_errors: ValidationErrors,
}

/// List all categories.
///
/// # Errors
///
/// Returns an error if categories cannot be loaded.
#[instrument(skip(state, ctx))]
pub async fn categories(
    State(state): State<AppState>,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let categories = state.cache().categories(state.pool()).await?;
    Ok(CategoriesTemplate { ctx, categories })
}

/// One page of a category's products.
///
/// # Errors
///
/// Returns 404 for an unknown category.
#[instrument(skip(state, ctx))]
pub async fn category(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let catalog = CatalogRepository::new(state.pool());
    let category = catalog
        .category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let page = Page::new(query.page, PER_PAGE);
    let (products, total) = catalog.products_in_category(category.id, page).await?;

    Ok(CategoryTemplate {
        ctx,
        category,
        products,
        total_pages: page.total_pages(total),
        page,
        total,
        page_query: String::new(),
    })
}

async fn product_page(
    state: &AppState,
    ctx: PageContext,
    slug: &str,
    review_errors: ValidationErrors,
) -> Result<ProductTemplate> {
    let catalog = CatalogRepository::new(state.pool());
    let product = catalog
        .product_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;
    let reviews = catalog.reviews(product.card.id).await?;

    let in_wishlist = match &ctx.user {
        Some(user) => {
            WishlistRepository::new(state.pool())
                .contains(user.id, product.card.id)
                .await?
        }
        None => false,
    };

    Ok(ProductTemplate {
        ctx,
        product,
        reviews,
        in_wishlist,
        review_errors,
    })
}

/// Product detail page.
///
/// # Errors
///
/// Returns 404 for an unknown or inactive product.
#[instrument(skip(state, ctx))]
pub async fn product(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    product_page(&state, ctx, &slug, ValidationErrors::new()).await
}

/// Rate a product. Re-rating replaces the earlier review.
///
/// # Errors
///
/// Returns 404 for an unknown product.
#[instrument(skip(state, ctx, form), fields(user_id = %user.id))]
pub async fn review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            let page = product_page(&state, ctx, &slug, errors).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let catalog = CatalogRepository::new(state.pool());
    let product = catalog
        .product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    catalog
        .upsert_review(user.id, product.card.id, valid.rating, valid.comment.as_deref())
        .await?;
    tracing::info!(product_id = %product.card.id, rating = valid.rating.value(), "Review saved");

    Ok(Redirect::to(&format!("/products/{slug}#reviews")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(rating: &str, comment: &str) -> ReviewForm {
        ReviewForm {
            rating: rating.to_string(),
            comment: comment.to_string(),
        }
    }

    #[test]
    fn test_valid_review() {
        let valid = form("4", "  ممتاز  ").validate();
        assert_eq!(
            valid.ok().map(|v| (v.rating.value(), v.comment)),
            Some((4, Some("ممتاز".to_string())))
        );
    }

    #[test]
    fn test_empty_comment_is_none() {
        let valid = form("5", "   ").validate();
        assert_eq!(valid.ok().and_then(|v| v.comment), None);
    }

    #[test]
    fn test_rating_out_of_range() {
        let errors = form("6", "").validate().err().unwrap_or_default();
        assert!(errors.has("rating"));
        let errors = form("abc", "").validate().err().unwrap_or_default();
        assert!(errors.has("rating"));
    }

    #[test]
    fn test_comment_too_long() {
        let long = "ن".repeat(MAX_COMMENT_CHARS + 1);
        let errors = form("3", &long).validate().err().unwrap_or_default();
        assert!(errors.has("comment"));
        assert!(!errors.has("rating"));
    }
}

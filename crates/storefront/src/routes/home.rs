//! Home page route handler.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::models::{Category, ProductCard};
use crate::routes::PageContext;
use crate::state::AppState;

/// Number of products in the "new arrivals" strip.
const NEWEST_LIMIT: i64 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub categories: Arc<Vec<Category>>,
    pub newest: Vec<ProductCard>,
}

/// Display the home page.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let categories = state.cache().categories(state.pool()).await?;
    let newest = CatalogRepository::new(state.pool())
        .newest(NEWEST_LIMIT)
        .await?;

    Ok(HomeTemplate {
        ctx,
        categories,
        newest,
    })
}

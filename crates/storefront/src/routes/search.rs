//! Product search.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use dukkan_core::Page;

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::filters;
use crate::models::ProductCard;
use crate::routes::PageContext;
use crate::routes::catalog::PER_PAGE;
use crate::state::AppState;

/// Longest accepted search term, in characters.
const MAX_QUERY_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// Search results page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub ctx: PageContext,
    pub query: String,
    pub products: Vec<ProductCard>,
    pub total: i64,
    pub page: Page,
    pub total_pages: u32,
    /// Query string prefix for pagination links, e.g. `q=milk&`.
    pub page_query: String,
}

/// Trim and cap the search term.
fn normalize_query(raw: Option<&str>) -> String {
    raw.unwrap_or_default()
        .trim()
        .chars()
        .take(MAX_QUERY_CHARS)
        .collect()
}

/// Search active products by name.
///
/// # Errors
///
/// Returns an error if the query fails.
#[instrument(skip(state, ctx))]
pub async fn search(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let query = normalize_query(params.q.as_deref());
    let page = Page::new(params.page, PER_PAGE);

    let (products, total) = if query.is_empty() {
        (Vec::new(), 0)
    } else {
        CatalogRepository::new(state.pool())
            .search(&query, page)
            .await?
    };

    Ok(SearchTemplate {
        ctx,
        page_query: format!("q={}&", urlencoding::encode(&query)),
        query,
        products,
        total,
        total_pages: page.total_pages(total),
        page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query(Some("  حليب  ")), "حليب");
        assert_eq!(normalize_query(None), "");
        let long = "ب".repeat(300);
        assert_eq!(normalize_query(Some(&long)).chars().count(), MAX_QUERY_CHARS);
    }
}

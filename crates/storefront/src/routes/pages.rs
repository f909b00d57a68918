//! Content page route handlers.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::routes::PageContext;
use crate::state::AppState;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub ctx: PageContext,
    pub content_html: Arc<String>,
}

/// Display the about page edited from the back-office.
///
/// # Errors
///
/// Returns an error if the content cannot be loaded.
#[instrument(skip(state, ctx))]
pub async fn about(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let content_html = state.cache().about_html(state.pool()).await?;
    Ok(AboutTemplate { ctx, content_html })
}

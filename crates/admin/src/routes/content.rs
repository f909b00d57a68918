//! About page editor.
//!
//! The body is markdown; the storefront renders it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ContentRepository;
use crate::db::content::ABOUT_KEY;
use crate::error::Result;
use crate::filters;
use crate::middleware::set_flash;
use crate::routes::PageContext;
use crate::state::AppState;

const MAX_BODY_CHARS: usize = 20_000;

#[derive(Debug, Deserialize)]
pub struct AboutForm {
    #[serde(default)]
    pub body: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "content/about.html")]
pub struct AboutTemplate {
    pub ctx: PageContext,
    pub body: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub error: Option<&'static str>,
}

/// The about page editor.
///
/// # Errors
///
/// Returns an error if the content cannot be loaded.
#[instrument(skip(state, ctx))]
pub async fn about(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let row = ContentRepository::new(state.pool()).get(ABOUT_KEY).await?;
    let (body, updated_at) = row.map_or((String::new(), None), |r| (r.body, Some(r.updated_at)));

    Ok(AboutTemplate {
        ctx,
        body,
        updated_at,
        error: None,
    })
}

/// Save the about page.
///
/// # Errors
///
/// Returns an error if the content cannot be saved.
#[instrument(skip(state, session, ctx, form), fields(chars = form.body.chars().count()))]
pub async fn save_about(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<AboutForm>,
) -> Result<Response> {
    if form.body.chars().count() > MAX_BODY_CHARS {
        let page = AboutTemplate {
            ctx,
            body: form.body,
            updated_at: None,
            error: Some("The page is too long"),
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    ContentRepository::new(state.pool())
        .upsert(ABOUT_KEY, form.body.trim())
        .await?;
    tracing::info!(admin_id = %ctx.admin.id, "About page updated");
    set_flash(&session, "About page saved").await?;
    Ok(Redirect::to("/content/about").into_response())
}

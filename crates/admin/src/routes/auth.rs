//! Admin authentication route handlers.
//!
//! Staff sign in with email and password. Only accounts with the `admin`
//! role can get past the login form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::{AdminAuthError, AdminAuthService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nonce: String,
    pub email: String,
    pub error: Option<&'static str>,
}

/// Display the login page, or go straight to the dashboard when signed in.
pub async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    CspNonce(nonce): CspNonce,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        nonce,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
///
/// # Errors
///
/// Returns an error if the session cannot be written or the lookup fails.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AdminAuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            session.cycle_id().await?;
            set_current_admin(&session, &CurrentAdmin::from(&user)).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            tracing::info!(admin_id = %user.id, "Admin logged in");
            Ok(Redirect::to("/").into_response())
        }
        Err(AdminAuthError::InvalidCredentials) => {
            tracing::info!("Admin login rejected");
            let page = LoginTemplate {
                nonce,
                email: form.email.trim().to_string(),
                error: Some("Invalid email or password"),
            };
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Sign out and return to the login page.
///
/// # Errors
///
/// Returns an error if the session cannot be cleared.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    session.cycle_id().await?;
    clear_sentry_user();
    Ok(Redirect::to("/auth/login"))
}

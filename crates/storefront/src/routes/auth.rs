//! Authentication route handlers.
//!
//! Email and password accounts stored locally. A successful login or
//! registration stores [`CurrentUser`] in the session and returns the
//! customer to the page that sent them to login.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_user, safe_next, set_current_user};
use crate::models::{CurrentUser, User};
use crate::routes::PageContext;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub next: String,
    pub error: Option<&'static str>,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub full_name: String,
    pub email: String,
    pub next: String,
    pub error: Option<&'static str>,
}

/// Start a fresh session for `user`.
async fn sign_in(session: &Session, user: &User) -> Result<()> {
    session.cycle_id().await?;
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(ctx: PageContext, Query(query): Query<NextQuery>) -> impl IntoResponse {
    LoginTemplate {
        ctx,
        email: String::new(),
        next: safe_next(query.next.as_deref()).to_string(),
        error: None,
    }
}

/// Handle login form submission.
///
/// # Errors
///
/// Returns an error if the session cannot be written or the lookup fails.
#[instrument(skip(state, session, ctx, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).to_string();

    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            sign_in(&session, &user).await?;
            tracing::info!(user_id = %user.id, "Customer logged in");
            Ok(Redirect::to(&next).into_response())
        }
        Err(err @ AuthError::InvalidCredentials) => {
            tracing::info!("Login rejected");
            let error = Some(err.user_message());
            let status = AppError::Auth(err).status();
            let page = LoginTemplate {
                ctx,
                email: form.email.trim().to_string(),
                next,
                error,
            };
            Ok((status, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(ctx: PageContext, Query(query): Query<NextQuery>) -> impl IntoResponse {
    RegisterTemplate {
        ctx,
        full_name: String::new(),
        email: String::new(),
        next: safe_next(query.next.as_deref()).to_string(),
        error: None,
    }
}

/// Handle registration form submission. New customers are logged in at once.
///
/// # Errors
///
/// Returns an error if the session cannot be written or the insert fails.
#[instrument(skip(state, session, ctx, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref()).to_string();
    let rerender = |ctx: PageContext, error: &'static str| RegisterTemplate {
        ctx,
        full_name: form.full_name.trim().to_string(),
        email: form.email.trim().to_string(),
        next: next.clone(),
        error: Some(error),
    };

    if form.password != form.password_confirm {
        let page = rerender(ctx, "كلمتا المرور غير متطابقتين");
        return Ok((axum::http::StatusCode::BAD_REQUEST, page).into_response());
    }

    match AuthService::new(state.pool())
        .register(&form.email, &form.password, &form.full_name)
        .await
    {
        Ok(user) => {
            sign_in(&session, &user).await?;
            tracing::info!(user_id = %user.id, "Customer registered");
            Ok(Redirect::to(&next).into_response())
        }
        Err(
            err @ (AuthError::InvalidEmail(_)
            | AuthError::InvalidName(_)
            | AuthError::WeakPassword { .. }
            | AuthError::UserAlreadyExists),
        ) => {
            let message = err.user_message();
            let status = AppError::Auth(err).status();
            Ok((status, rerender(ctx, message)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout. The whole session is destroyed.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}

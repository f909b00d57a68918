//! Storefront errors.
//!
//! Handlers return [`Result`]; failures become a small Arabic error page.
//! Server-side causes go to Sentry and the log, never to the customer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database: {0}")]
    Database(#[from] RepositoryError),

    #[error("auth: {0}")]
    Auth(#[from] AuthError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("session: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("internal: {0}")]
    Internal(String),
}

#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
struct ErrorPage {
    status: u16,
    message: &'static str,
}

impl AppError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::UserAlreadyExists) => StatusCode::CONFLICT,
            Self::Auth(
                AuthError::WeakPassword { .. } | AuthError::InvalidEmail(_) | AuthError::InvalidName(_),
            ) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
            | Self::Database(_)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            Self::Auth(err) => err.user_message(),
            _ => match self.status() {
                StatusCode::NOT_FOUND => "الصفحة المطلوبة غير موجودة",
                _ => "حدث خطأ غير متوقع، يرجى المحاولة لاحقاً",
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let page = ErrorPage {
            status: status.as_u16(),
            message: self.public_message(),
        };
        (status, page).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Attach the signed-in customer to Sentry events from this request.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_rows_are_404() {
        let response = AppError::Database(RepositoryError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = AppError::NotFound("product tahini-500g".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(
            AppError::Auth(AuthError::UserAlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::PasswordHash).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_not_shown() {
        let err = AppError::Internal("pool timed out after 30s".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("pool"));
        assert_eq!(err.to_string(), "internal: pool timed out after 30s");
    }

    #[test]
    fn test_error_page_is_rtl_html() {
        let html = ErrorPage {
            status: 404,
            message: "الصفحة المطلوبة غير موجودة",
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains(r#"dir="rtl""#));
        assert!(html.contains("الصفحة المطلوبة غير موجودة"));
    }
}

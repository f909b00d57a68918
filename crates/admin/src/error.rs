//! Back-office errors.
//!
//! Staff see what went wrong for client errors (a refused status change, a
//! missing order). Server errors show a Sentry reference instead of details.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::{OrderUpdateError, RepositoryError};
use crate::services::AdminAuthError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database: {0}")]
    Database(#[from] RepositoryError),

    #[error("auth: {0}")]
    Auth(#[from] AdminAuthError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("session: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<OrderUpdateError> for AppError {
    fn from(err: OrderUpdateError) -> Self {
        match err {
            OrderUpdateError::NotFound => Self::NotFound("order".to_string()),
            OrderUpdateError::Repository(e) => Self::Database(e),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
struct ErrorPage {
    status: u16,
    reason: &'static str,
    detail: String,
    event_id: Option<String>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Auth(AdminAuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Auth(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (detail, event_id) = if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Admin request failed");
            (
                "Something went wrong on our side. Try again, and report the reference if it keeps happening."
                    .to_string(),
                Some(event_id.to_string()),
            )
        } else {
            tracing::info!(error = %self, status = status.as_u16(), "Admin request refused");
            (self.to_string(), None)
        };

        let page = ErrorPage {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error"),
            detail,
            event_id,
        };
        (status, page).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Tag Sentry events from this request with the staff member.
pub fn set_sentry_user(admin_user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
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
    use dukkan_core::OrderStatus;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_client_errors_read_as_sentences() {
        assert_eq!(
            AppError::NotFound("order 2401".to_string()).to_string(),
            "order 2401 not found"
        );
        assert_eq!(
            AppError::BadRequest("choose a driver".to_string()).to_string(),
            "choose a driver"
        );
    }

    #[test]
    fn test_error_page_shows_reference() {
        let html = ErrorPage {
            status: 500,
            reason: "Internal Server Error",
            detail: "Something went wrong".to_string(),
            event_id: Some("abc123".to_string()),
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains("<code>abc123</code>"));
        assert!(html.contains(r#"dir="ltr""#));
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("slug".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Auth(AdminAuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_order_update_errors_map_to_client_errors() {
        assert_eq!(
            get_status(OrderUpdateError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(
                OrderUpdateError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Canceled,
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
    }
}

//! Driver management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use dukkan_core::{DriverId, FullName, PhoneNumber, ValidationErrors};

use crate::db::{DriverRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::set_flash;
use crate::models::{Driver, DriverInput};
use crate::routes::{PageContext, optional};
use crate::state::AppState;

const MAX_VEHICLE_CHARS: usize = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DriverForm {
    pub full_name: String,
    pub phone: String,
    pub vehicle: String,
}

impl DriverForm {
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> std::result::Result<DriverInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let full_name = errors.check(
            "full_name",
            FullName::parse(&self.full_name),
            "Enter the driver's full name",
        );
        let phone = errors.check(
            "phone",
            PhoneNumber::parse(&self.phone),
            "Enter a Saudi mobile number, e.g. 0551234567",
        );
        let vehicle = optional(&self.vehicle);
        if vehicle
            .as_deref()
            .is_some_and(|v| v.chars().count() > MAX_VEHICLE_CHARS)
        {
            errors.add("vehicle", "Vehicle description is too long");
        }

        errors.into_result()?;
        match (full_name, phone) {
            (Some(full_name), Some(phone)) => Ok(DriverInput {
                full_name,
                phone,
                vehicle,
            }),
            _ => Err(ValidationErrors::new()),
        }
    }
}

impl From<&Driver> for DriverForm {
    fn from(driver: &Driver) -> Self {
        Self {
            full_name: driver.full_name.clone(),
            phone: PhoneNumber::parse(&driver.phone)
                .map_or_else(|_| driver.phone.clone(), |p| p.local()),
            vehicle: driver.vehicle.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "drivers/index.html")]
pub struct DriversIndexTemplate {
    pub ctx: PageContext,
    pub drivers: Vec<Driver>,
}

#[derive(Template, WebTemplate)]
#[template(path = "drivers/form.html")]
pub struct DriverFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub is_new: bool,
    pub form: DriverForm,
    pub errors: ValidationErrors,
}

/// All drivers, active first.
///
/// # Errors
///
/// Returns an error if the drivers cannot be loaded.
#[instrument(skip(state, ctx))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let drivers = DriverRepository::new(state.pool()).list().await?;
    Ok(DriversIndexTemplate { ctx, drivers })
}

#[instrument(skip(ctx))]
pub async fn new_form(ctx: PageContext) -> impl IntoResponse {
    DriverFormTemplate {
        ctx,
        action: "/drivers".to_string(),
        is_new: true,
        form: DriverForm::default(),
        errors: ValidationErrors::new(),
    }
}

async fn save(
    state: &AppState,
    session: &Session,
    mut page: DriverFormTemplate,
    id: Option<DriverId>,
) -> Result<Response> {
    let input = match page.form.validate() {
        Ok(input) => input,
        Err(errors) => {
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let drivers = DriverRepository::new(state.pool());
    let result = match id {
        Some(id) => drivers.update(id, &input).await.map(|()| id),
        None => drivers.create(&input).await,
    };

    match result {
        Ok(id) => {
            tracing::info!(driver_id = %id, "Driver saved");
            set_flash(session, format!("Saved {}", input.full_name.as_str())).await?;
            Ok(Redirect::to("/drivers").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            page.errors.add("phone", "Another driver already uses this number");
            Ok((StatusCode::CONFLICT, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Create a driver.
///
/// # Errors
///
/// Returns an error if the driver cannot be saved.
#[instrument(skip(state, session, ctx, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<DriverForm>,
) -> Result<Response> {
    let page = DriverFormTemplate {
        ctx,
        action: "/drivers".to_string(),
        is_new: true,
        form,
        errors: ValidationErrors::new(),
    };
    save(&state, &session, page, None).await
}

/// Edit form.
///
/// # Errors
///
/// Returns 404 if the driver does not exist.
#[instrument(skip(state, ctx))]
pub async fn edit_form(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = DriverId::new(id);
    let driver = DriverRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("driver {id}")))?;

    Ok(DriverFormTemplate {
        ctx,
        action: format!("/drivers/{id}"),
        is_new: false,
        form: DriverForm::from(&driver),
        errors: ValidationErrors::new(),
    })
}

/// Save driver changes.
///
/// # Errors
///
/// Returns 404 if the driver does not exist.
#[instrument(skip(state, session, ctx, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<i32>,
    Form(form): Form<DriverForm>,
) -> Result<Response> {
    let id = DriverId::new(id);
    let page = DriverFormTemplate {
        ctx,
        action: format!("/drivers/{id}"),
        is_new: false,
        form,
        errors: ValidationErrors::new(),
    };
    save(&state, &session, page, Some(id)).await
}

/// Activate or deactivate a driver. Inactive drivers cannot be assigned.
///
/// # Errors
///
/// Returns 404 if the driver does not exist.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let id = DriverId::new(id);
    let active = DriverRepository::new(state.pool())
        .toggle_active(id)
        .await?;
    tracing::info!(driver_id = %id, active, "Driver availability changed");
    set_flash(
        &session,
        if active {
            "Driver activated"
        } else {
            "Driver deactivated"
        },
    )
    .await?;
    Ok(Redirect::to("/drivers"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_driver_normalizes_phone() {
        let form = DriverForm {
            full_name: "سالم العتيبي".to_string(),
            phone: "055 123 4567".to_string(),
            vehicle: "  ".to_string(),
        };
        let input = form.validate().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(input.phone.as_str(), "+966551234567");
        assert_eq!(input.vehicle, None);
    }

    #[test]
    fn test_invalid_driver_reports_each_field() {
        let form = DriverForm {
            full_name: String::new(),
            phone: "12345".to_string(),
            vehicle: "x".repeat(MAX_VEHICLE_CHARS + 1),
        };
        let errors = form.validate().err().unwrap_or_default();
        assert!(errors.has("full_name"));
        assert!(errors.has("phone"));
        assert!(errors.has("vehicle"));
    }
}

//! Delivery shift route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveTime;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use dukkan_core::{ShiftId, ShiftWindow, ValidationErrors};

use crate::db::ShiftRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::set_flash;
use crate::models::{Shift, ShiftInput};
use crate::routes::PageContext;
use crate::state::AppState;

const MAX_NAME_CHARS: usize = 50;
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShiftForm {
    pub name: String,
    /// `HH:MM`, as sent by `<input type="time">`.
    pub start: String,
    pub end: String,
    pub position: String,
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).ok()
}

impl ShiftForm {
    /// # Errors
    ///
    /// Returns every invalid field; an end time not after the start is
    /// reported on `end`.
    pub fn validate(&self) -> std::result::Result<ShiftInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Name is required");
        } else if name.chars().count() > MAX_NAME_CHARS {
            errors.add("name", "Name is too long");
        }

        let start = parse_time(&self.start);
        if start.is_none() {
            errors.add("start", "Enter a start time such as 09:00");
        }
        let end = parse_time(&self.end);
        if end.is_none() {
            errors.add("end", "Enter an end time such as 12:00");
        }
        let window = match (start, end) {
            (Some(start), Some(end)) => errors.check(
                "end",
                ShiftWindow::new(start, end),
                "End time must be after the start time",
            ),
            _ => None,
        };

        let position = match self.position.trim() {
            "" => Some(0),
            value => errors.check("position", value.parse::<i32>(), "Position must be a number"),
        };

        errors.into_result()?;
        match window {
            Some(window) => Ok(ShiftInput {
                name: name.to_string(),
                window,
                position: position.unwrap_or_default(),
            }),
            None => Err(ValidationErrors::new()),
        }
    }
}

impl From<&Shift> for ShiftForm {
    fn from(shift: &Shift) -> Self {
        Self {
            name: shift.name.clone(),
            start: shift.window.start.format(TIME_FORMAT).to_string(),
            end: shift.window.end.format(TIME_FORMAT).to_string(),
            position: shift.position.to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "shifts/index.html")]
pub struct ShiftsIndexTemplate {
    pub ctx: PageContext,
    pub shifts: Vec<Shift>,
}

#[derive(Template, WebTemplate)]
#[template(path = "shifts/form.html")]
pub struct ShiftFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub is_new: bool,
    pub form: ShiftForm,
    pub errors: ValidationErrors,
}

/// All shifts in checkout order.
///
/// # Errors
///
/// Returns an error if the shifts cannot be loaded.
#[instrument(skip(state, ctx))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let shifts = ShiftRepository::new(state.pool()).list().await?;
    Ok(ShiftsIndexTemplate { ctx, shifts })
}

#[instrument(skip(ctx))]
pub async fn new_form(ctx: PageContext) -> impl IntoResponse {
    ShiftFormTemplate {
        ctx,
        action: "/shifts".to_string(),
        is_new: true,
        form: ShiftForm::default(),
        errors: ValidationErrors::new(),
    }
}

async fn save(
    state: &AppState,
    session: &Session,
    mut page: ShiftFormTemplate,
    id: Option<ShiftId>,
) -> Result<Response> {
    let input = match page.form.validate() {
        Ok(input) => input,
        Err(errors) => {
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let shifts = ShiftRepository::new(state.pool());
    let id = match id {
        Some(id) => {
            shifts.update(id, &input).await?;
            id
        }
        None => shifts.create(&input).await?,
    };

    tracing::info!(shift_id = %id, window = %input.window.label(), "Shift saved");
    set_flash(session, format!("Saved {}", input.name)).await?;
    Ok(Redirect::to("/shifts").into_response())
}

/// Create a shift.
///
/// # Errors
///
/// Returns an error if the shift cannot be saved.
#[instrument(skip(state, session, ctx, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<ShiftForm>,
) -> Result<Response> {
    let page = ShiftFormTemplate {
        ctx,
        action: "/shifts".to_string(),
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
/// Returns 404 if the shift does not exist.
#[instrument(skip(state, ctx))]
pub async fn edit_form(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = ShiftId::new(id);
    let shift = ShiftRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("shift {id}")))?;

    Ok(ShiftFormTemplate {
        ctx,
        action: format!("/shifts/{id}"),
        is_new: false,
        form: ShiftForm::from(&shift),
        errors: ValidationErrors::new(),
    })
}

/// Save shift changes.
///
/// # Errors
///
/// Returns 404 if the shift does not exist.
#[instrument(skip(state, session, ctx, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<i32>,
    Form(form): Form<ShiftForm>,
) -> Result<Response> {
    let id = ShiftId::new(id);
    let page = ShiftFormTemplate {
        ctx,
        action: format!("/shifts/{id}"),
        is_new: false,
        form,
        errors: ValidationErrors::new(),
    };
    save(&state, &session, page, Some(id)).await
}

/// Offer or withdraw a shift at checkout. Existing orders keep their shift.
///
/// # Errors
///
/// Returns 404 if the shift does not exist.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let id = ShiftId::new(id);
    let active = ShiftRepository::new(state.pool())
        .toggle_active(id)
        .await?;
    tracing::info!(shift_id = %id, active, "Shift availability changed");
    set_flash(
        &session,
        if active {
            "Shift is offered at checkout"
        } else {
            "Shift is no longer offered at checkout"
        },
    )
    .await?;
    Ok(Redirect::to("/shifts"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(start: &str, end: &str) -> ShiftForm {
        ShiftForm {
            name: "Evening".to_string(),
            start: start.to_string(),
            end: end.to_string(),
            position: "2".to_string(),
        }
    }

    #[test]
    fn test_valid_shift() {
        let input = form("18:00", "21:00")
            .validate()
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(input.window.label(), "18:00 - 21:00");
        assert_eq!(input.position, 2);
    }

    #[test]
    fn test_end_must_follow_start() {
        let errors = form("21:00", "18:00").validate().err().unwrap_or_default();
        assert!(errors.has("end"));
        assert!(!errors.has("start"));

        let errors = form("18:00", "18:00").validate().err().unwrap_or_default();
        assert!(errors.has("end"));
    }

    #[test]
    fn test_unparseable_times() {
        let errors = form("6pm", "").validate().err().unwrap_or_default();
        assert!(errors.has("start"));
        assert!(errors.has("end"));
    }

    #[test]
    fn test_form_round_trips_existing_shift() {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or_default();
        let shift = Shift {
            id: ShiftId::new(1),
            name: "Morning".to_string(),
            window: ShiftWindow::new(t(9), t(12)).unwrap_or_else(|e| panic!("{e}")),
            is_active: true,
            position: 0,
        };
        let form = ShiftForm::from(&shift);
        assert_eq!((form.start.as_str(), form.end.as_str()), ("09:00", "12:00"));
    }
}

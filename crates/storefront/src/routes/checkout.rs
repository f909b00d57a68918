//! Checkout page and order placement.
//!
//! A fresh idempotency key is rendered into every checkout form. Posting the
//! same form twice returns the order created by the first post.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use dukkan_core::{FullName, PaymentMethod, PhoneNumber, ValidationErrors, store_local_time};

use crate::db::{AddressRepository, CartRepository, ShiftRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, set_current_user};
use crate::models::{Address, Cart, CurrentUser, ShiftOption};
use crate::routes::PageContext;
use crate::services::checkout::{CheckoutError, CheckoutForm, CheckoutService};
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub cart: Cart,
    pub addresses: Vec<Address>,
    pub shifts: Vec<ShiftOption>,
    pub payment_methods: [PaymentMethod; 2],
    pub form: CheckoutForm,
    pub errors: ValidationErrors,
    /// Banner shown above the form after a failed submission.
    pub message: Option<String>,
}

/// Everything the checkout page shows besides the form itself.
async fn render(
    state: &AppState,
    ctx: PageContext,
    user: &CurrentUser,
    form: CheckoutForm,
    errors: ValidationErrors,
    message: Option<String>,
) -> Result<CheckoutTemplate> {
    let cart = CartRepository::new(state.pool()).get(user.id).await?;
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;

    let local_now = store_local_time(Utc::now(), state.config().store_utc_offset_minutes)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let shifts = ShiftRepository::new(state.pool())
        .active()
        .await?
        .into_iter()
        .map(|shift| ShiftOption::at(shift, local_now))
        .collect();

    Ok(CheckoutTemplate {
        ctx,
        cart,
        addresses,
        shifts,
        payment_methods: PaymentMethod::ALL,
        form,
        errors,
        message,
    })
}

/// Checkout form prefilled from the customer's profile and default address.
fn initial_form(full_name: &str, phone: Option<&str>, addresses: &[Address]) -> CheckoutForm {
    CheckoutForm {
        full_name: full_name.to_string(),
        phone: phone
            .and_then(|p| PhoneNumber::parse(p).ok())
            .map(|p| p.local())
            .unwrap_or_default(),
        address_id: addresses
            .iter()
            .find(|a| a.is_default)
            .map(|a| a.id.to_string())
            .unwrap_or_default(),
        payment_method: PaymentMethod::CashOnDelivery.as_str().to_string(),
        idempotency_key: Uuid::new_v4().to_string(),
        ..CheckoutForm::default()
    }
}

/// Display the checkout page. An empty cart goes back to `/cart`.
///
/// # Errors
///
/// Returns an error if the page data cannot be loaded.
#[instrument(skip(state, ctx), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<Response> {
    let mut page = render(
        &state,
        ctx,
        &user,
        CheckoutForm::default(),
        ValidationErrors::new(),
        None,
    )
    .await?;

    if page.cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let profile = UserRepository::new(state.pool()).get_by_id(user.id).await?;
    let (name, phone) = profile.map_or_else(
        || (user.full_name.clone(), None),
        |p| (p.full_name, p.phone),
    );
    page.form = initial_form(&name, phone.as_deref(), &page.addresses);

    Ok(page.into_response())
}

/// Place the order.
///
/// Success is a 303 to the order tracking page. Invalid fields re-render the
/// form with 422; business failures re-render it with a banner.
///
/// # Errors
///
/// Returns an error if the page cannot be re-rendered.
#[instrument(skip(state, ctx, session, form), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let service = CheckoutService::new(state.pool(), state.pusher());

    let err = match service.place_order(user.id, &form, Utc::now()).await {
        Ok(placed) => {
            if placed.profile_updated {
                refresh_session_name(&session, &user, &form.full_name).await;
            }
            return Ok(Redirect::to(&format!("/account/orders/{}", placed.order_number))
                .into_response());
        }
        Err(err) => err,
    };

    let (status, errors) = match &err {
        CheckoutError::EmptyCart => return Ok(Redirect::to("/cart").into_response()),
        CheckoutError::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, errors.clone()),
        CheckoutError::Repository(e) => {
            let event_id = sentry::capture_error(e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Checkout failed");
            (StatusCode::INTERNAL_SERVER_ERROR, ValidationErrors::new())
        }
        CheckoutError::AddressNotFound
        | CheckoutError::ShiftNotFound
        | CheckoutError::OutOfStock(_) => {
            tracing::info!(reason = %err, "Checkout rejected");
            (StatusCode::CONFLICT, ValidationErrors::new())
        }
    };

    let page = render(&state, ctx, &user, form, errors, Some(err.user_message())).await?;
    Ok((status, page).into_response())
}

async fn refresh_session_name(session: &Session, user: &CurrentUser, raw_name: &str) {
    let Ok(name) = FullName::parse(raw_name) else {
        return;
    };
    let updated = CurrentUser {
        full_name: name.as_str().to_string(),
        ..user.clone()
    };
    if let Err(e) = set_current_user(session, &updated).await {
        tracing::warn!(error = %e, "Failed to refresh session name");
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use dukkan_core::{AddressId, UserId};

    use super::*;

    fn address(id: i32, is_default: bool) -> Address {
        Address {
            id: AddressId::new(id),
            user_id: UserId::new(1),
            label: None,
            district: "النرجس".to_string(),
            street: "شارع الأمير".to_string(),
            building: "12".to_string(),
            floor: None,
            apartment: None,
            landmark: None,
            instructions: None,
            location: None,
            is_default,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_initial_form_uses_default_address() {
        let form = initial_form("سارة", None, &[address(4, false), address(9, true)]);
        assert_eq!(form.address_id, "9");
        assert_eq!(form.full_name, "سارة");
        assert_eq!(form.payment_method, "CASH_ON_DELIVERY");
        assert!(Uuid::parse_str(&form.idempotency_key).is_ok());
    }

    #[test]
    fn test_initial_form_shows_local_phone() {
        let form = initial_form("سارة", Some("+966512345678"), &[]);
        assert_eq!(form.phone, "0512345678");
        assert_eq!(form.address_id, "");
    }

    #[test]
    fn test_each_form_gets_a_new_key() {
        let a = initial_form("سارة", None, &[]);
        let b = initial_form("سارة", None, &[]);
        assert_ne!(a.idempotency_key, b.idempotency_key);
    }
}

//! Address book handlers.
//!
//! Addresses are managed from the account area and, with `next=/checkout`,
//! from the checkout page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use dukkan_core::{AddressId, GeoPoint, ValidationErrors, extract_coordinates};

use crate::db::{AddressRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, safe_next};
use crate::models::{Address, AddressInput};
use crate::routes::PageContext;
use crate::state::AppState;

const MAX_REQUIRED_CHARS: usize = 100;
const MAX_OPTIONAL_CHARS: usize = 200;

/// Raw address form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressForm {
    pub label: String,
    pub district: String,
    pub street: String,
    pub building: String,
    pub floor: String,
    pub apartment: String,
    pub landmark: String,
    pub instructions: String,
    pub lat: String,
    pub lng: String,
    /// A shared map link; used when `lat`/`lng` are blank.
    pub maps_link: String,
    /// Where to go after saving.
    pub next: String,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl AddressForm {
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> std::result::Result<AddressInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, value, message) in [
            ("district", &self.district, "الحي مطلوب"),
            ("street", &self.street, "الشارع مطلوب"),
            ("building", &self.building, "رقم المبنى مطلوب"),
        ] {
            let value = value.trim();
            if value.is_empty() {
                errors.add(field, message);
            } else if value.chars().count() > MAX_REQUIRED_CHARS {
                errors.add(field, "القيمة أطول من المسموح");
            }
        }

        for (field, value) in [
            ("label", &self.label),
            ("floor", &self.floor),
            ("apartment", &self.apartment),
            ("landmark", &self.landmark),
            ("instructions", &self.instructions),
        ] {
            if value.trim().chars().count() > MAX_OPTIONAL_CHARS {
                errors.add(field, "القيمة أطول من المسموح");
            }
        }

        let location = self.location(&mut errors);

        errors.into_result()?;
        Ok(AddressInput {
            label: optional(&self.label),
            district: self.district.trim().to_string(),
            street: self.street.trim().to_string(),
            building: self.building.trim().to_string(),
            floor: optional(&self.floor),
            apartment: optional(&self.apartment),
            landmark: optional(&self.landmark),
            instructions: optional(&self.instructions),
            location,
        })
    }

    /// Explicit coordinates win over a pasted map link. Both blank is fine.
    fn location(&self, errors: &mut ValidationErrors) -> Option<GeoPoint> {
        let (lat, lng) = (self.lat.trim(), self.lng.trim());
        if !lat.is_empty() || !lng.is_empty() {
            let point = match (lat.parse::<f64>(), lng.parse::<f64>()) {
                (Ok(lat), Ok(lng)) => GeoPoint::new(lat, lng).ok(),
                _ => None,
            };
            if point.is_none() {
                errors.add("location", "الإحداثيات غير صالحة");
            }
            return point;
        }

        let link = self.maps_link.trim();
        if link.is_empty() {
            return None;
        }
        errors.check(
            "maps_link",
            extract_coordinates(link),
            "تعذر قراءة الموقع من الرابط",
        )
    }
}

impl From<&Address> for AddressForm {
    fn from(address: &Address) -> Self {
        Self {
            label: address.label.clone().unwrap_or_default(),
            district: address.district.clone(),
            street: address.street.clone(),
            building: address.building.clone(),
            floor: address.floor.clone().unwrap_or_default(),
            apartment: address.apartment.clone().unwrap_or_default(),
            landmark: address.landmark.clone().unwrap_or_default(),
            instructions: address.instructions.clone().unwrap_or_default(),
            lat: address.location.map(|p| p.lat.to_string()).unwrap_or_default(),
            lng: address.location.map(|p| p.lng.to_string()).unwrap_or_default(),
            maps_link: String::new(),
            next: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Address list template.
#[derive(Template, WebTemplate)]
#[template(path = "addresses/index.html")]
pub struct AddressesTemplate {
    pub ctx: PageContext,
    pub addresses: Vec<Address>,
    pub message: Option<String>,
}

/// New/edit address form template.
#[derive(Template, WebTemplate)]
#[template(path = "addresses/form.html")]
pub struct AddressFormTemplate {
    pub ctx: PageContext,
    pub action: String,
    pub is_new: bool,
    pub form: AddressForm,
    pub errors: ValidationErrors,
}

fn after_save(next: &str) -> String {
    if next.is_empty() {
        "/account/addresses".to_string()
    } else {
        safe_next(Some(next)).to_string()
    }
}

/// List the customer's addresses, default first.
///
/// # Errors
///
/// Returns an error if the addresses cannot be loaded.
#[instrument(skip(state, ctx), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(AddressesTemplate {
        ctx,
        addresses,
        message: None,
    })
}

/// Blank address form.
#[instrument(skip(ctx, _user))]
pub async fn new_form(
    RequireAuth(_user): RequireAuth,
    ctx: PageContext,
    Query(query): Query<NextQuery>,
) -> impl IntoResponse {
    AddressFormTemplate {
        ctx,
        action: "/account/addresses".to_string(),
        is_new: true,
        form: AddressForm {
            next: query.next.unwrap_or_default(),
            ..AddressForm::default()
        },
        errors: ValidationErrors::new(),
    }
}

/// Save a new address.
///
/// # Errors
///
/// Returns an error if the address cannot be saved.
#[instrument(skip(state, ctx, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let page = AddressFormTemplate {
                ctx,
                action: "/account/addresses".to_string(),
                is_new: true,
                form,
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    tracing::info!(address_id = %address.id, is_default = address.is_default, "Address created");

    Ok(Redirect::to(&after_save(&form.next)).into_response())
}

/// Edit form for an owned address.
///
/// # Errors
///
/// Returns 404 if the address is not the customer's.
#[instrument(skip(state, ctx), fields(user_id = %user.id))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = AddressId::new(id);
    let address = AddressRepository::new(state.pool())
        .get_owned(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))?;

    Ok(AddressFormTemplate {
        ctx,
        action: format!("/account/addresses/{id}"),
        is_new: false,
        form: AddressForm::from(&address),
        errors: ValidationErrors::new(),
    })
}

/// Save changes to an owned address.
///
/// # Errors
///
/// Returns 404 if the address is not the customer's.
#[instrument(skip(state, ctx, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(id): Path<i32>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let id = AddressId::new(id);
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let page = AddressFormTemplate {
                ctx,
                action: format!("/account/addresses/{id}"),
                is_new: false,
                form,
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    AddressRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?;

    Ok(Redirect::to(&after_save(&form.next)).into_response())
}

/// Delete an owned address. Addresses used by past orders are kept.
///
/// # Errors
///
/// Returns 404 if the address is not the customer's.
#[instrument(skip(state, ctx), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<Response> {
    let addresses = AddressRepository::new(state.pool());

    match addresses.delete(user.id, AddressId::new(id)).await {
        Ok(()) => Ok(Redirect::to("/account/addresses").into_response()),
        Err(RepositoryError::Conflict(_)) => {
            let page = AddressesTemplate {
                ctx,
                addresses: addresses.list(user.id).await?,
                message: Some("لا يمكن حذف عنوان مستخدم في طلبات سابقة".to_string()),
            };
            Ok((StatusCode::CONFLICT, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Make an owned address the default.
///
/// # Errors
///
/// Returns 404 if the address is not the customer's.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn set_default(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Form(query): Form<NextQuery>,
) -> Result<Redirect> {
    AddressRepository::new(state.pool())
        .set_default(user.id, AddressId::new(id))
        .await?;
    Ok(Redirect::to(&after_save(query.next.as_deref().unwrap_or_default())))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn form() -> AddressForm {
        AddressForm {
            district: " النرجس ".to_string(),
            street: "شارع الأمير".to_string(),
            building: "12".to_string(),
            ..AddressForm::default()
        }
    }

    #[test]
    fn test_valid_address_trims_fields() {
        let input = form().validate().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(input.district, "النرجس");
        assert_eq!(input.floor, None);
        assert_eq!(input.location, None);
    }

    #[test]
    fn test_required_fields() {
        let errors = AddressForm::default().validate().err().unwrap_or_default();
        assert!(errors.has("district"));
        assert!(errors.has("street"));
        assert!(errors.has("building"));
    }

    #[test]
    fn test_location_from_map_link() {
        let mut f = form();
        f.maps_link = "https://maps.google.com/?q=24.7136,46.6753".to_string();
        let input = f.validate().unwrap_or_else(|e| panic!("{e}"));
        let point = input.location.unwrap_or_else(|| panic!("no location"));
        assert_eq!((point.lat, point.lng), (24.7136, 46.6753));
    }

    #[test]
    fn test_explicit_coordinates_win() {
        let mut f = form();
        f.lat = "21.5".to_string();
        f.lng = "39.2".to_string();
        f.maps_link = "https://maps.google.com/?q=24.7136,46.6753".to_string();
        let point = f.validate().ok().and_then(|i| i.location);
        assert_eq!(point.map(|p| p.lat), Some(21.5));
    }

    #[test]
    fn test_bad_coordinates_rejected() {
        let mut f = form();
        f.lat = "95".to_string();
        f.lng = "46".to_string();
        assert!(f.validate().err().unwrap_or_default().has("location"));

        let mut f = form();
        f.maps_link = "not a map".to_string();
        assert!(f.validate().err().unwrap_or_default().has("maps_link"));
    }

    #[test]
    fn test_after_save_rejects_external_targets() {
        assert_eq!(after_save(""), "/account/addresses");
        assert_eq!(after_save("/checkout"), "/checkout");
        assert_eq!(after_save("https://evil.example"), "/");
    }
}

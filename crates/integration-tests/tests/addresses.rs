//! Address form handling, including coordinates from shared map links.

#![allow(clippy::float_cmp)]

use dukkan_core::{LocationError, extract_coordinates};
use dukkan_storefront::routes::addresses::AddressForm;

fn riyadh_address() -> AddressForm {
    AddressForm {
        district: "النرجس".to_string(),
        street: "طريق أنس بن مالك".to_string(),
        building: "4521".to_string(),
        ..AddressForm::default()
    }
}

#[test]
fn test_minimal_address_has_no_location() {
    let input = riyadh_address()
        .validate()
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(input.district, "النرجس");
    assert_eq!(input.label, None);
    assert_eq!(input.location, None);
}

#[test]
fn test_map_link_fills_location() {
    let form = AddressForm {
        maps_link: "https://www.google.com/maps/place/Riyadh/@24.8147,46.6432,17z".to_string(),
        ..riyadh_address()
    };
    let point = form
        .validate()
        .unwrap_or_else(|e| panic!("{e}"))
        .location
        .unwrap_or_else(|| panic!("location expected"));
    assert_eq!((point.lat, point.lng), (24.8147, 46.6432));
}

#[test]
fn test_explicit_coordinates_win_over_link() {
    let form = AddressForm {
        lat: "21.5433".to_string(),
        lng: "39.1728".to_string(),
        maps_link: "https://maps.google.com/?q=24.7136,46.6753".to_string(),
        ..riyadh_address()
    };
    let point = form
        .validate()
        .unwrap_or_else(|e| panic!("{e}"))
        .location
        .unwrap_or_else(|| panic!("location expected"));
    assert_eq!((point.lat, point.lng), (21.5433, 39.1728));
}

#[test]
fn test_unreadable_link_is_a_field_error() {
    let form = AddressForm {
        maps_link: "https://example.com/somewhere".to_string(),
        ..riyadh_address()
    };
    let errors = form.validate().err().unwrap_or_default();
    assert!(errors.has("maps_link"));
}

#[test]
fn test_out_of_range_coordinates_are_rejected() {
    let form = AddressForm {
        lat: "124.0".to_string(),
        lng: "46.6".to_string(),
        ..riyadh_address()
    };
    let errors = form.validate().err().unwrap_or_default();
    assert!(errors.has("location"));
}

#[test]
fn test_required_fields() {
    let errors = AddressForm::default().validate().err().unwrap_or_default();
    assert!(errors.has("district"));
    assert!(errors.has("street"));
    assert!(errors.has("building"));
}

#[test]
fn test_extract_coordinates_pin_format() {
    let point = extract_coordinates("https://www.google.com/maps/place/x/data=!3d24.7136!4d46.6753")
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!((point.lat, point.lng), (24.7136, 46.6753));
    assert_eq!(extract_coordinates(""), Err(LocationError::NotFound));
}

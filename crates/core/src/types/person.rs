//! Recipient name and phone number.
//!
//! Both appear on the checkout form and are copied onto the user record when
//! they change, so they are validated once here.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors from parsing a [`FullName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("name must be at least {min} characters")]
    TooShort { min: usize },
    #[error("name must be at most {max} characters")]
    TooLong { max: usize },
}

/// A person's display name, trimmed with inner whitespace collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FullName(String);

impl FullName {
    pub const MIN_CHARS: usize = 2;
    pub const MAX_CHARS: usize = 100;

    /// Parse a name, counting characters rather than bytes so Arabic names
    /// get the same limits as Latin ones.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] if the collapsed name is outside 2..=100 chars.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
        let chars = collapsed.chars().count();
        if chars < Self::MIN_CHARS {
            return Err(NameError::TooShort {
                min: Self::MIN_CHARS,
            });
        }
        if chars > Self::MAX_CHARS {
            return Err(NameError::TooLong {
                max: Self::MAX_CHARS,
            });
        }
        Ok(Self(collapsed))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number cannot be empty")]
    Empty,
    #[error("phone number may only contain digits, spaces, dashes and a leading +")]
    InvalidCharacters,
    #[error("phone number must be a Saudi mobile number (05XXXXXXXX)")]
    NotMobile,
}

/// A Saudi mobile number stored in E.164 form (`+9665XXXXXXXX`).
///
/// Accepts the common ways customers type it: `0551234567`, `551234567`,
/// `+966 55 123 4567`, `00966551234567`.
///
/// ```
/// use dukkan_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("055 123 4567").unwrap();
/// assert_eq!(phone.as_str(), "+966551234567");
/// assert_eq!(phone.local(), "0551234567");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const COUNTRY_CODE: &'static str = "966";
    const SUBSCRIBER_DIGITS: usize = 9;

    /// Parse and normalize a mobile number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] if the input is empty, contains other
    /// characters, or is not a 9-digit subscriber number starting with 5.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let (plus, rest) = trimmed
            .strip_prefix('+')
            .map_or((false, trimmed), |rest| (true, rest));
        if !rest
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
        {
            return Err(PhoneError::InvalidCharacters);
        }
        let digits: String = rest.chars().filter(char::is_ascii_digit).collect();

        let candidate = if plus {
            digits.strip_prefix(Self::COUNTRY_CODE)
        } else if let Some(intl) = digits.strip_prefix("00") {
            intl.strip_prefix(Self::COUNTRY_CODE)
        } else if digits.len() == Self::SUBSCRIBER_DIGITS + Self::COUNTRY_CODE.len() {
            digits.strip_prefix(Self::COUNTRY_CODE)
        } else {
            Some(digits.strip_prefix('0').unwrap_or(&digits))
        };
        let subscriber = candidate.ok_or(PhoneError::NotMobile)?;

        if subscriber.len() != Self::SUBSCRIBER_DIGITS || !subscriber.starts_with('5') {
            return Err(PhoneError::NotMobile);
        }

        Ok(Self(format!("+{}{subscriber}", Self::COUNTRY_CODE)))
    }

    /// E.164 form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local form with a leading zero, as customers write it.
    #[must_use]
    pub fn local(&self) -> String {
        let subscriber = self
            .0
            .strip_prefix('+')
            .and_then(|s| s.strip_prefix(Self::COUNTRY_CODE))
            .unwrap_or(&self.0);
        format!("0{subscriber}")
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_collapses_whitespace() {
        let name = FullName::parse("  محمد   عبدالله ").unwrap();
        assert_eq!(name.as_str(), "محمد عبدالله");
    }

    #[test]
    fn test_full_name_counts_chars_not_bytes() {
        // Two Arabic letters are four bytes but two characters.
        assert!(FullName::parse("عل").is_ok());
        assert_eq!(
            FullName::parse("ع"),
            Err(NameError::TooShort { min: 2 })
        );
        assert_eq!(
            FullName::parse(&"a".repeat(101)),
            Err(NameError::TooLong { max: 100 })
        );
    }

    #[test]
    fn test_phone_accepts_common_formats() {
        for input in [
            "0551234567",
            "551234567",
            "+966551234567",
            "+966 55 123 4567",
            "00966551234567",
            "966551234567",
            "055-123-4567",
        ] {
            assert_eq!(
                PhoneNumber::parse(input).map(|p| p.as_str().to_owned()),
                Ok("+966551234567".to_owned()),
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_phone_rejects_invalid() {
        assert_eq!(PhoneNumber::parse(" "), Err(PhoneError::Empty));
        assert_eq!(
            PhoneNumber::parse("05512a4567"),
            Err(PhoneError::InvalidCharacters)
        );
        assert_eq!(PhoneNumber::parse("0112345678"), Err(PhoneError::NotMobile));
        assert_eq!(PhoneNumber::parse("055123456"), Err(PhoneError::NotMobile));
        assert_eq!(
            PhoneNumber::parse("+971551234567"),
            Err(PhoneError::NotMobile)
        );
    }

    #[test]
    fn test_phone_local_form() {
        let phone = PhoneNumber::parse("+966501112233").unwrap();
        assert_eq!(phone.local(), "0501112233");
    }
}

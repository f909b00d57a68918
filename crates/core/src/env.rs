//! Environment lookups shared by the storefront, admin and CLI config
//! loaders.
//!
//! Blank values count as unset, so `FOO=` in a `.env` file behaves like a
//! missing line.

use std::collections::HashMap;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Shortest accepted session secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Random 32+ character secrets land well above this.
const MIN_BITS_PER_CHAR: f64 = 3.3;

/// Fragments of values copied from `.env.example` files.
const PLACEHOLDERS: &[&str] = &[
    "changeme",
    "change-me",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "your-",
    "xxx",
    "todo",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("{0} is not set")]
    Missing(String),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: String, reason: String },
    #[error("{key} is not safe to use: {reason}")]
    Insecure { key: String, reason: String },
}

/// A non-blank variable.
///
/// # Errors
///
/// Returns `EnvError::Missing` when unset or blank.
pub fn required(key: &str) -> Result<String, EnvError> {
    optional(key).ok_or_else(|| EnvError::Missing(key.to_string()))
}

#[must_use]
pub fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `key`, or `default` when it is unset.
///
/// # Errors
///
/// Returns `EnvError::Invalid` when the value (or default) does not parse.
pub fn parse_or<T>(key: &str, default: &str) -> Result<T, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(key)
        .as_deref()
        .unwrap_or(default)
        .parse()
        .map_err(|e: T::Err| EnvError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// The binary's own database variable, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `EnvError::Missing` naming `primary` when neither is set.
pub fn database_url(primary: &str) -> Result<SecretString, EnvError> {
    optional(primary)
        .or_else(|| optional("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| EnvError::Missing(primary.to_string()))
}

/// A required secret that passes [`secret_weakness`].
///
/// # Errors
///
/// Returns `EnvError::Missing` or `EnvError::Insecure`.
pub fn secret(key: &str) -> Result<SecretString, EnvError> {
    let value = required(key)?;
    if let Some(reason) = secret_weakness(&value) {
        return Err(EnvError::Insecure {
            key: key.to_string(),
            reason,
        });
    }
    Ok(SecretString::from(value))
}

/// Why `value` should not be used as a secret, if it should not.
#[must_use]
pub fn secret_weakness(value: &str) -> Option<String> {
    if value.len() < MIN_SECRET_LEN {
        return Some(format!(
            "must be at least {MIN_SECRET_LEN} characters, got {}",
            value.len()
        ));
    }

    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDERS.iter().find(|p| lower.contains(*p)) {
        return Some(format!("looks like a placeholder (contains '{pattern}')"));
    }

    let bits = bits_per_char(value);
    (bits < MIN_BITS_PER_CHAR).then(|| {
        format!("too predictable ({bits:.2} bits/char); generate it with `openssl rand -base64 48`")
    })
}

/// Shannon entropy of the character distribution.
fn bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    let mut total = 0u32;
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_char() {
        assert!(bits_per_char("").abs() < f64::EPSILON);
        assert!(bits_per_char("aaaa").abs() < f64::EPSILON);
        assert!((bits_per_char("abab") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_secret_is_weak() {
        let reason = secret_weakness("Zq8!w");
        assert!(reason.is_some_and(|r| r.contains("at least 32")));
    }

    #[test]
    fn test_placeholder_secret_is_weak() {
        let reason = secret_weakness("replace-with-a-real-session-key-0123456789");
        assert!(reason.is_some_and(|r| r.contains("placeholder")));
    }

    #[test]
    fn test_repetitive_secret_is_weak() {
        let reason = secret_weakness(&"ab".repeat(20));
        assert!(reason.is_some_and(|r| r.contains("predictable")));
    }

    #[test]
    fn test_random_secret_is_accepted() {
        assert_eq!(secret_weakness("k9T$vQ2!mW7@xL4#pR8&nZ1*bH6^cJ3%"), None);
    }

    #[test]
    fn test_unset_variable_uses_default() {
        let port: Result<u16, _> = parse_or("DUKKAN_TEST_UNSET_PORT_VARIABLE", "3000");
        assert_eq!(port, Ok(3000));

        let bad: Result<u16, _> = parse_or("DUKKAN_TEST_UNSET_PORT_VARIABLE", "port");
        assert!(matches!(bad, Err(EnvError::Invalid { .. })));
    }
}

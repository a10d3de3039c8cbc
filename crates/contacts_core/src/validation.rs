//! Contact input validation.
//!
//! # Responsibility
//! - Turn an untyped JSON payload into a normalized, validated contact.
//! - Produce the short human-readable messages returned to API callers.
//!
//! # Invariants
//! - `ValidContact` can only be built by [`validate_contact`].
//! - Validation is pure; no store access happens here.
//! - Missing fields are reported before any format check runs.

use crate::model::contact::ContactFields;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));

/// Date-only formats accepted when the birthday is not `YYYY-MM-DD` shaped.
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];
/// Date-time formats accepted in addition to RFC 3339.
const FALLBACK_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Payload keys in the order they are reported when missing.
pub const REQUIRED_FIELDS: [&str; 5] = ["firstName", "lastName", "email", "favoriteColor", "birthday"];

/// Validation failure with a caller-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    /// Names of required fields that were absent or blank.
    MissingFields(Vec<&'static str>),
    InvalidEmail,
    InvalidBirthday,
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields(fields) => {
                write!(f, "Missing required field(s): {}", fields.join(", "))
            }
            Self::InvalidEmail => write!(f, "Invalid email format"),
            Self::InvalidBirthday => {
                write!(f, "birthday must be an ISO date (e.g. 1995-03-12)")
            }
        }
    }
}

impl Error for ContactValidationError {}

/// Contact fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact(ContactFields);

impl ValidContact {
    pub fn fields(&self) -> &ContactFields {
        &self.0
    }

    pub fn into_fields(self) -> ContactFields {
        self.0
    }
}

/// Validates and normalizes a raw contact payload.
///
/// Every required value is coerced to a string and trimmed; `email` is also
/// lower-cased. A payload that is not a JSON object has all fields missing.
pub fn validate_contact(payload: &Value) -> Result<ValidContact, ContactValidationError> {
    let [first_name, last_name, email, favorite_color, birthday] =
        REQUIRED_FIELDS.map(|key| sanitize(payload.get(key)));
    let email = email.to_lowercase();

    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .zip([&first_name, &last_name, &email, &favorite_color, &birthday])
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| *key)
        .collect();
    if !missing.is_empty() {
        return Err(ContactValidationError::MissingFields(missing));
    }

    if !EMAIL_RE.is_match(&email) {
        return Err(ContactValidationError::InvalidEmail);
    }
    if !is_accepted_date(&birthday) {
        return Err(ContactValidationError::InvalidBirthday);
    }

    Ok(ValidContact(ContactFields {
        first_name,
        last_name,
        email,
        favorite_color,
        birthday,
    }))
}

/// Returns whether `value` is accepted as a birthday.
///
/// `YYYY-MM-DD` is matched by shape only; other inputs must parse with one of
/// the explicit fallback formats.
pub fn is_accepted_date(value: &str) -> bool {
    if ISO_DATE_RE.is_match(value) {
        return true;
    }
    if DateTime::parse_from_rfc3339(value).is_ok() {
        return true;
    }
    FALLBACK_DATETIME_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
        || FALLBACK_DATE_FORMATS
            .iter()
            .any(|format| NaiveDate::parse_from_str(value, format).is_ok())
}

fn sanitize(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

//! Parsing helpers shared by the HTML forms.
//!
//! Browsers post every field as a string. These helpers turn those strings into
//! typed values and reject anything that would otherwise reach the database.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be {constraint}")]
    OutOfRange {
        field: &'static str,
        constraint: &'static str,
    },

    #[error("'{value}' is not a valid {field}")]
    InvalidChoice { field: &'static str, value: String },

    #[error("{field} is not well formed: '{value}'")]
    InvalidFormat { field: &'static str, value: String },
}

/// Checks a typed payload before it is handed to a store.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(value.to_string())
}

pub(crate) fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub(crate) fn required_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

pub(crate) fn email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    required_text(field, value)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field,
            value: value.to_string(),
        }),
    }
}

pub(crate) fn parse<T: FromStr>(field: &'static str, value: &str) -> Result<T, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    value.parse().map_err(|_| ValidationError::InvalidFormat {
        field,
        value: value.to_string(),
    })
}

/// Like [`parse`] but keeps the choice error raised by the target type.
pub(crate) fn choice<T>(field: &'static str, value: &str) -> Result<T, ValidationError>
where
    T: FromStr<Err = ValidationError>,
{
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    value.parse()
}

pub(crate) fn optional_choice<T>(
    field: &'static str,
    value: &str,
) -> Result<Option<T>, ValidationError>
where
    T: FromStr<Err = ValidationError>,
{
    match optional(value) {
        None => Ok(None),
        Some(value) => choice(field, &value).map(Some),
    }
}

pub(crate) fn parse_optional<T: FromStr>(
    field: &'static str,
    value: &str,
) -> Result<Option<T>, ValidationError> {
    match optional(value) {
        None => Ok(None),
        Some(value) => parse(field, &value).map(Some),
    }
}

pub(crate) fn non_negative(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ValidationError::OutOfRange {
            field,
            constraint: "zero or more",
        }),
        _ => Ok(()),
    }
}

pub(crate) fn date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field,
        value: value.to_string(),
    })
}

/// Accepts `HH:MM` as sent by `<input type="time">` as well as `HH:MM:SS`.
pub(crate) fn time(field: &'static str, value: &str) -> Result<NaiveTime, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidFormat {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("city", "  Pune "), Ok("Pune".to_string()));
        assert_eq!(required("city", "   "), Err(ValidationError::Required("city")));
    }

    #[test]
    fn optional_numbers() {
        assert_eq!(parse_optional::<f64>("height_cm", ""), Ok(None));
        assert_eq!(parse_optional::<f64>("height_cm", "172.5"), Ok(Some(172.5)));
        assert!(matches!(
            parse_optional::<f64>("height_cm", "tall"),
            Err(ValidationError::InvalidFormat { field: "height_cm", .. })
        ));
    }

    #[test]
    fn email_needs_both_halves() {
        assert!(email("email", "a@b.org").is_ok());
        assert!(email("email", "@b.org").is_err());
        assert!(email("email", "nobody").is_err());
        assert_eq!(email("email", ""), Err(ValidationError::Required("email")));
    }

    #[test]
    fn time_accepts_browser_and_database_shapes() {
        let expected = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(time("appointment_time", "09:30"), Ok(expected));
        assert_eq!(time("appointment_time", "09:30:00"), Ok(expected));
        assert!(time("appointment_time", "half past nine").is_err());
    }

    #[test]
    fn negative_measurements_are_rejected() {
        assert!(non_negative("weight_kg", Some(-1.0)).is_err());
        assert!(non_negative("weight_kg", Some(0.0)).is_ok());
        assert!(non_negative("weight_kg", None).is_ok());
    }
}

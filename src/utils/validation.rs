use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Datelike, NaiveDate};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::AppError;
use crate::models::employee::Sex;

/// Required on create; on update, required only to be non-blank when present.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "fullName",
    "nicNumber",
    "dateOfBirth",
    "sex",
    "district",
    "permanentAddress",
    "contactDetails",
];

/// Whole years between `date_of_birth` and `as_of`.
///
/// The birthday itself counts: someone born on 2000-03-15 is 24 on 2024-03-15
/// and still 23 the day before. A 29 February birthday is reached on 1 March
/// in non-leap years.
pub fn derive_age(date_of_birth: NaiveDate, as_of: NaiveDate) -> i32 {
    let mut age = as_of.year() - date_of_birth.year();
    if (as_of.month(), as_of.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// `^[0-9]{9}[VvXx]?$`
pub fn validate_nic_format(value: &str) -> bool {
    let bytes = value.as_bytes();
    let digits_ok = |digits: &[u8]| digits.iter().all(u8::is_ascii_digit);
    match bytes.len() {
        9 => digits_ok(bytes),
        10 => digits_ok(&bytes[..9]) && matches!(bytes[9], b'V' | b'v' | b'X' | b'x'),
        _ => false,
    }
}

/// Returns every key of `required_keys` whose value in `payload` is absent,
/// null or blank after trimming, in the order the keys were asked for.
pub fn require_fields<'k>(
    payload: &[(&str, Option<&str>)],
    required_keys: &[&'k str],
) -> Vec<&'k str> {
    required_keys
        .iter()
        .copied()
        .filter(|key| {
            let value = payload
                .iter()
                .find(|(name, _)| name == key)
                .and_then(|(_, value)| *value);
            value.map_or(true, |v| v.trim().is_empty())
        })
        .collect()
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping only the calendar date.
pub fn parse_date_of_birth(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// True when `value` is standard base64 that decodes to a known image format.
pub fn is_base64_image(value: &str) -> bool {
    STANDARD
        .decode(value.trim())
        .map(|bytes| infer::is_image(&bytes))
        .unwrap_or(false)
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn validate_nic(nic_number: &str) -> Result<(), ValidationError> {
    if !validate_nic_format(nic_number.trim()) {
        return Err(invalid(
            "nic_format",
            "NIC number must be 9 digits optionally followed by V or X",
        ));
    }
    Ok(())
}

pub fn validate_date_of_birth(date_of_birth: &str) -> Result<(), ValidationError> {
    if parse_date_of_birth(date_of_birth).is_none() {
        return Err(invalid("date", "Date of birth must be a valid date (YYYY-MM-DD)"));
    }
    Ok(())
}

pub fn validate_sex(sex: &str) -> Result<(), ValidationError> {
    if sex.trim().parse::<Sex>().is_err() {
        return Err(invalid("sex", "Sex must be one of Male, Female or Other"));
    }
    Ok(())
}

/// An empty photo means "no photo" and is always accepted.
pub fn validate_photo(photo: &str) -> Result<(), ValidationError> {
    if !photo.trim().is_empty() && !is_base64_image(photo) {
        return Err(invalid("photo", "Photo must be a base64 encoded image"));
    }
    Ok(())
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn map_validation_errors(errors: ValidationErrors) -> AppError {
    let mut failures: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let detail = errs
                .iter()
                .map(|e| e.message.as_deref().unwrap_or(&e.code).to_string())
                .collect::<Vec<_>>()
                .join(", ");
            (camel_case(field), detail)
        })
        .collect();
    failures.sort();

    let message = failures
        .iter()
        .map(|(field, detail)| format!("{}: {}", field, detail))
        .collect::<Vec<_>>()
        .join("; ");
    AppError::validation(
        format!("Validation failed: {}", message),
        failures.into_iter().map(|(field, _)| field).collect(),
    )
}

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(map_validation_errors)
}

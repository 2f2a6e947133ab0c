//! Field checks shared by the form-backed services.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::{DomainError, DomainResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Trimmed value of a required field
pub fn required(value: &str, field: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// `None` for absent or blank values, otherwise the trimmed text
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn parse_date(value: &str, field: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        DomainError::validation(format!("{} must be in YYYY-MM-DD format", field))
    })
}

/// Validates an optional date and returns it normalised
pub fn optional_date(value: Option<&str>, field: &str) -> DomainResult<Option<String>> {
    match optional(value) {
        Some(raw) => Ok(Some(format_date(parse_date(&raw, field)?))),
        None => Ok(None),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Digits only, between 7 and 15 characters
pub fn is_valid_phone(phone: &str) -> bool {
    (7..=15).contains(&phone.len()) && phone.chars().all(|c| c.is_ascii_digit())
}

/// A strictly positive, finite amount
pub fn positive_amount(amount: f64, message: &str) -> DomainResult<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(DomainError::validation(message));
    }
    Ok(amount)
}

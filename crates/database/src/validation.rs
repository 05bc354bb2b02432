//! Input validation for entity fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Billing month outside 1..=12.
    InvalidMonth(i64),
    /// Billing year not positive.
    InvalidYear(i64),
    /// A room was paired with an apartment it does not belong to.
    RoomApartmentMismatch { room_id: i64, apartment_id: i64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::InvalidMonth(month) => {
                write!(f, "Invalid month: {} (expected 1-12)", month)
            }
            ValidationError::InvalidYear(year) => write!(f, "Invalid year: {}", year),
            ValidationError::RoomApartmentMismatch {
                room_id,
                apartment_id,
            } => write!(
                f,
                "Room {} does not belong to apartment {}",
                room_id, apartment_id
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for apartment and room codes.
pub const MAX_CODE_LENGTH: usize = 64;

/// Maximum allowed length for names and titles.
pub const MAX_NAME_LENGTH: usize = 255;

/// Validate a required, length-bounded text field and return it trimmed.
pub fn validate_required<'a>(
    field: &str,
    value: &'a str,
    max: usize,
) -> Result<&'a str, ValidationError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }

    Ok(value)
}

/// Validate an apartment or room code.
pub fn validate_code<'a>(field: &str, code: &'a str) -> Result<&'a str, ValidationError> {
    validate_required(field, code, MAX_CODE_LENGTH)
}

/// Validate a billing period.
pub fn validate_period(month: i64, year: i64) -> Result<(), ValidationError> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::InvalidMonth(month));
    }
    if year <= 0 {
        return Err(ValidationError::InvalidYear(year));
    }
    Ok(())
}

/// Rewrite a local number (`0...`) to international form (`84...`).
///
/// Every stored customer phone is in this form.
pub fn normalize_phone(phone: &str) -> String {
    let phone = phone.trim();
    match phone.strip_prefix('0') {
        Some(rest) => format!("84{}", rest),
        None => phone.to_string(),
    }
}

/// Substring `LIKE` pattern with `%`, `_` and `\` taken literally.
///
/// Use with `ESCAPE '\'`.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

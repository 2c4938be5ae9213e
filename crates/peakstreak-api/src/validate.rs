//! Request checks applied before anything reaches the service.

use chrono::NaiveDate;

use crate::error::ApiError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const HABIT_NAME_MAX: usize = 100;
const HUE_MAX: i32 = 360;

pub fn username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(3..=50).contains(&len) || !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::bad_request(
            "username must be 3-50 letters or digits",
        ));
    }
    Ok(())
}

pub fn email(email: &str) -> Result<(), ApiError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ApiError::bad_request("email is not valid"));
    }
    Ok(())
}

pub fn password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 || !password.chars().all(|c| (' '..='~').contains(&c)) {
        return Err(ApiError::bad_request(
            "password must be at least 8 printable ASCII characters",
        ));
    }
    Ok(())
}

pub fn habit_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || name.chars().count() > HABIT_NAME_MAX {
        return Err(ApiError::bad_request("habit name must be 1-100 characters"));
    }
    Ok(())
}

pub fn color_hue(hue: i32) -> Result<(), ApiError> {
    if !(0..=HUE_MAX).contains(&hue) {
        return Err(ApiError::bad_request("colorHue must be between 0 and 360"));
    }
    Ok(())
}

pub fn log_value(value: i64) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::bad_request("value must not be negative"));
    }
    Ok(())
}

pub fn log_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| ApiError::bad_request("invalid date format, please use YYYY-MM-DD"))
}

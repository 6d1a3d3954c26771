use std::sync::LazyLock;

use regex::Regex;

use crate::utils::error::CustomError;

pub const MAX_TITLE_LENGTH: usize = 256;
pub const MAX_USERNAME_LENGTH: usize = 150;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern"));
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern")
});

pub fn validate_password(password: &str) -> Result<(), CustomError> {
    let length = password.chars().count();
    if !(8..=20).contains(&length) {
        return Err(CustomError::ValidationError(
            "Password must be between 8 and 20 characters long.".into(),
        ));
    }

    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_lowercase || !has_uppercase || !has_digit {
        return Err(CustomError::ValidationError(
            "Password must include at least one uppercase letter, one lowercase letter, and one number.".into(),
        ));
    }

    Ok(())
}

/// Non-empty after trimming and at most `max` characters.
pub fn validate_text(field: &str, value: &str, max: Option<usize>) -> Result<(), CustomError> {
    if value.trim().is_empty() {
        return Err(CustomError::ValidationError(format!(
            "{} cannot be empty",
            field
        )));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(CustomError::ValidationError(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), CustomError> {
    if !SLUG_RE.is_match(slug) {
        return Err(CustomError::ValidationError(
            "Slug may only contain latin letters, digits, hyphens and underscores".into(),
        ));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), CustomError> {
    if username.chars().count() > MAX_USERNAME_LENGTH || !USERNAME_RE.is_match(username) {
        return Err(CustomError::ValidationError(
            "Username may contain letters, digits and @/./+/-/_ only (max 150 characters)".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), CustomError> {
    if !EMAIL_RE.is_match(email) {
        return Err(CustomError::ValidationError("Enter a valid email address".into()));
    }
    Ok(())
}

use crate::shared::error::AppError;

/// Minimum password length accepted at sign-up and password update.
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn require_field(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Cheap structural check; the backend performs the authoritative validation.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let trimmed = email.trim();
    let mut parts = trimmed.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(AppError::Validation(format!(
            "Invalid email address: {trimmed}"
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() {
        return Err(AppError::Validation("Price must be a number".to_string()));
    }
    if price <= 0.0 {
        return Err(AppError::Validation(
            "Price must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(validate_email("emily@example.com").is_ok());
        assert!(validate_email("  spaced@example.co  ").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
    }

    #[test]
    fn rejects_short_passwords() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn rejects_non_positive_prices() {
        assert!(validate_price(0.0).is_err());
        assert!(validate_price(-5.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(34.0).is_ok());
    }
}

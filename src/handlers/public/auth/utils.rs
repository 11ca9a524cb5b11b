use crate::error::ApiError;
use crate::handlers::non_empty;

use super::register::RegisterRequest;

/// Registration input after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Validate email format
///
/// One `@`, non-empty local part, and a domain containing a dot that neither
/// starts nor ends the domain.
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err("Invalid email format".to_string());
    }

    let domain = parts[1];
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("Invalid email format".to_string());
    }

    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Password length is counted in characters, not bytes
pub fn validate_password(password: &str, min_length: usize) -> Result<(), String> {
    if password.chars().count() < min_length {
        return Err(format!("Password must be at least {} characters", min_length));
    }
    Ok(())
}

pub fn validate_registration(
    request: RegisterRequest,
    min_password_length: usize,
) -> Result<ValidRegistration, ApiError> {
    let (Some(email), Some(password)) = (non_empty(request.email), request.password.filter(|p| !p.is_empty())) else {
        return Err(ApiError::validation_error("Email and password are required", None));
    };

    let email = email.to_lowercase();
    validate_email_format(&email).map_err(|msg| ApiError::field("email", msg))?;
    validate_password(&password, min_password_length).map_err(|msg| ApiError::field("password", msg))?;

    Ok(ValidRegistration {
        email,
        password,
        name: non_empty(request.name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: Option<&str>, password: Option<&str>, name: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn accepts_valid_registration() {
        let valid = validate_registration(request(Some(" Shopper@Example.com "), Some("secret1"), Some("  Ana ")), 6).unwrap();
        assert_eq!(valid.email, "shopper@example.com");
        assert_eq!(valid.password, "secret1");
        assert_eq!(valid.name.as_deref(), Some("Ana"));
    }

    #[test]
    fn blank_name_becomes_absent() {
        let valid = validate_registration(request(Some("a@b.co"), Some("secret1"), Some("   ")), 6).unwrap();
        assert_eq!(valid.name, None);
    }

    #[test]
    fn requires_email_and_password() {
        assert!(validate_registration(request(None, Some("secret1"), None), 6).is_err());
        assert!(validate_registration(request(Some("a@b.co"), None, None), 6).is_err());
        assert!(validate_registration(request(Some("  "), Some("secret1"), None), 6).is_err());
        assert!(validate_registration(request(Some("a@b.co"), Some(""), None), 6).is_err());
    }

    #[test]
    fn rejects_short_password() {
        let err = validate_registration(request(Some("a@b.co"), Some("12345"), None), 6).unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["password"], "Password must be at least 6 characters");
        assert!(validate_registration(request(Some("a@b.co"), Some("123456"), None), 6).is_ok());
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(validate_password("ñññññ", 6).is_err());
        assert!(validate_password("ññññññ", 6).is_ok());
    }

    #[test]
    fn email_format() {
        assert!(validate_email_format("user@example.com").is_ok());
        assert!(validate_email_format("user@localhost").is_err());
        assert!(validate_email_format("user@@example.com").is_err());
        assert!(validate_email_format("@example.com").is_err());
        assert!(validate_email_format("user@.com").is_err());
        assert!(validate_email_format("us er@example.com").is_err());
    }
}

//! Input validation for registry requests

/// Validate an email before it is hashed and signed.
///
/// The value is signed exactly as given, so no trimming or case folding
/// happens here; surrounding whitespace is rejected instead.
pub fn validate_email(email: &str, max_len: usize) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err("Email cannot be empty");
    }
    if email.len() > max_len {
        return Err("Email is too long");
    }
    if email.trim() != email {
        return Err("Email cannot start or end with whitespace");
    }
    if email.chars().any(char::is_control) {
        return Err("Email cannot contain control characters");
    }

    let (local, domain) = email.rsplit_once('@').ok_or("Email must contain '@'")?;
    if local.is_empty() {
        return Err("Email local part cannot be empty");
    }
    if domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
        return Err("Email domain is invalid");
    }
    Ok(())
}

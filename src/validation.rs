use validator::ValidateEmail;

/// Maximum length for a commit email address
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum length for a hostname
const MAX_HOSTNAME_LENGTH: usize = 253;

// Validate input helper functions

/// Validates a `--email` value
pub fn validate_input_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        Err("--email requires a non-empty value".to_string())
    } else if email.len() > MAX_EMAIL_LENGTH {
        Err(format!("email too long, max {} characters", MAX_EMAIL_LENGTH))
    } else if !email.validate_email() {
        Err(format!("invalid email format: '{email}'"))
    } else {
        Ok(())
    }
}

/// Validates a `--hostname` value
pub fn validate_input_hostname(hostname: &str) -> Result<(), String> {
    if hostname.trim().is_empty() {
        Err("--hostname requires a non-empty value".to_string())
    } else if hostname.len() > MAX_HOSTNAME_LENGTH {
        Err(format!("hostname too long, max {} characters", MAX_HOSTNAME_LENGTH))
    } else if hostname.chars().any(|c| c.is_whitespace() || c == '/') {
        Err(format!("invalid hostname: '{hostname}'"))
    } else {
        Ok(())
    }
}

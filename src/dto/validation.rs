//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest team, player or tournament name accepted, in characters.
pub const MAX_LABEL_CHARS: usize = 40;

/// Validates a human-facing label: non-blank once trimmed and reasonably short.
///
/// # Examples
///
/// ```ignore
/// validate_label("Sami")     // Ok
/// validate_label("   ")      // Err - blank
/// validate_label(&"x".repeat(41)) // Err - too long
/// ```
pub fn validate_label(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("label_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_LABEL_CHARS {
        let mut err = ValidationError::new("label_length");
        err.message = Some(
            format!("Name must be at most {MAX_LABEL_CHARS} characters (got {chars})").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a match code is a single token without whitespace.
pub fn validate_code_token(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("code_format");
        err.message = Some("Code must be a single token".into());
        return Err(err);
    }
    Ok(())
}

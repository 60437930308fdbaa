//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a room code is exactly 6 uppercase alphanumeric characters.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("A1B2C3") // Ok
/// validate_room_code("a1b2c3") // Err - lowercase
/// validate_room_code("A1B2C")  // Err - too short
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != 6 {
        let mut err = ValidationError::new("room_code_length");
        err.message =
            Some(format!("Room code must be exactly 6 characters (got {})", code.len()).into());
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_lowercase())
    {
        let mut err = ValidationError::new("room_code_format");
        err.message =
            Some("Room code must contain only uppercase alphanumeric characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_code_valid() {
        assert!(validate_room_code("A1B2C3").is_ok());
        assert!(validate_room_code("ZZZZZZ").is_ok());
        assert!(validate_room_code("000000").is_ok());
    }

    #[test]
    fn test_validate_room_code_invalid_length() {
        assert!(validate_room_code("A1B2C").is_err()); // too short
        assert!(validate_room_code("A1B2C3D").is_err()); // too long
        assert!(validate_room_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_room_code_invalid_format() {
        assert!(validate_room_code("a1b2c3").is_err()); // lowercase
        assert!(validate_room_code("A1B2C!").is_err()); // punctuation
        assert!(validate_room_code("A1B 2C").is_err()); // space
    }
}

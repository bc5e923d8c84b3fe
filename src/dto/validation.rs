//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted room identifier.
const MAX_ROOM_ID_LEN: usize = 64;
/// Longest accepted display name.
const MAX_NAME_LEN: usize = 32;
/// Longest accepted chat message.
const MAX_CHAT_LEN: usize = 512;

/// Validates that a room identifier is non-empty, within length limits, and
/// free of control characters.
pub fn validate_room_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        let mut err = ValidationError::new("room_id_empty");
        err.message = Some("Room identifier must not be empty".into());
        return Err(err);
    }

    if id.len() > MAX_ROOM_ID_LEN {
        let mut err = ValidationError::new("room_id_length");
        err.message = Some(
            format!("Room identifier must be at most {MAX_ROOM_ID_LEN} characters").into(),
        );
        return Err(err);
    }

    if id.chars().any(char::is_control) {
        let mut err = ValidationError::new("room_id_format");
        err.message = Some("Room identifier must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a participant display name is non-empty, within length
/// limits, and free of control characters.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name_empty");
        err.message = Some("Display name must not be empty".into());
        return Err(err);
    }

    if name.len() > MAX_NAME_LEN {
        let mut err = ValidationError::new("display_name_length");
        err.message =
            Some(format!("Display name must be at most {MAX_NAME_LEN} characters").into());
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("display_name_format");
        err.message = Some("Display name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a chat message is non-empty and within length limits.
pub fn validate_chat_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("chat_text_empty");
        err.message = Some("Chat message must not be empty".into());
        return Err(err);
    }

    if text.len() > MAX_CHAT_LEN {
        let mut err = ValidationError::new("chat_text_length");
        err.message =
            Some(format!("Chat message must be at most {MAX_CHAT_LEN} characters").into());
        return Err(err);
    }

    Ok(())
}

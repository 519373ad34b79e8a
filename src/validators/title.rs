use super::ValidationError;

pub const MAX_TITLE_LENGTH: usize = 100;

/// Organization and team titles: non-blank, at most 100 characters.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::TitleEmpty);
    }

    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong(MAX_TITLE_LENGTH));
    }

    Ok(())
}

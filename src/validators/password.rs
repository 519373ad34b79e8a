use super::ValidationError;

/// Length bounds for passwords set through the user endpoints.
///
/// ```
/// use authgate::validators::PasswordPolicy;
///
/// let policy = PasswordPolicy::default().min(10);
/// assert!(policy.validate("ten-chars!").is_ok());
/// assert!(policy.validate("nine-char").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

impl PasswordPolicy {
    #[must_use]
    pub fn min(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    #[must_use]
    pub fn max(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    /// # Errors
    ///
    /// Returns a `ValidationError` when the password is empty or out of bounds.
    pub fn validate(&self, password: &str) -> Result<(), ValidationError> {
        if password.is_empty() {
            return Err(ValidationError::PasswordEmpty);
        }

        let len = password.chars().count();
        if len < self.min_length {
            return Err(ValidationError::PasswordTooShort(self.min_length));
        }
        if len > self.max_length {
            return Err(ValidationError::PasswordTooLong(self.max_length));
        }

        Ok(())
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    PasswordPolicy::default().validate(password)
}

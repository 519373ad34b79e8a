pub mod email;
pub mod password;
pub mod title;

pub use email::validate_email;
pub use password::{PasswordPolicy, validate_password};
pub use title::validate_title;

use std::fmt;

/// Field-level input errors. [`ValidationError::field`] names the offending
/// request field so the HTTP layer can report it.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmailEmpty,
    EmailTooLong,
    EmailInvalidFormat,
    PasswordEmpty,
    PasswordTooShort(usize),
    PasswordTooLong(usize),
    TitleEmpty,
    TitleTooLong(usize),
    /// A required body field was absent.
    Required(&'static str),
    /// A query parameter outside its fixed set of values.
    InvalidChoice {
        field: &'static str,
        choices: &'static [&'static str],
    },
    /// A field that may only be given when the object is created.
    ImmutableField(&'static str),
    /// A body field referenced an id that does not exist.
    MissingObject { field: &'static str, pk: String },
    /// The request body did not match the expected shape.
    InvalidBody(String),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmailEmpty | Self::EmailTooLong | Self::EmailInvalidFormat => "email",
            Self::PasswordEmpty | Self::PasswordTooShort(_) | Self::PasswordTooLong(_) => {
                "password"
            }
            Self::TitleEmpty | Self::TitleTooLong(_) => "title",
            Self::Required(field) | Self::ImmutableField(field) => *field,
            Self::InvalidChoice { field, .. } | Self::MissingObject { field, .. } => *field,
            Self::InvalidBody(_) => "body",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailEmpty => write!(f, "Email cannot be empty"),
            Self::EmailTooLong => write!(f, "Email is too long (max 254 characters)"),
            Self::EmailInvalidFormat => write!(f, "Enter a valid email address."),
            Self::PasswordEmpty => write!(f, "Password cannot be empty"),
            Self::PasswordTooShort(min) => {
                write!(f, "Password must be at least {min} characters")
            }
            Self::PasswordTooLong(max) => {
                write!(f, "Password is too long (max {max} characters)")
            }
            Self::TitleEmpty => write!(f, "Title cannot be empty"),
            Self::TitleTooLong(max) => write!(f, "Title is too long (max {max} characters)"),
            Self::Required(_) => write!(f, "This field is required."),
            Self::InvalidChoice { choices, .. } => {
                write!(f, "Must be one of [{}]", choices.join(", "))
            }
            Self::ImmutableField(_) => write!(f, "This field can only be set on creation."),
            Self::MissingObject { pk, .. } => {
                write!(f, "Invalid pk \"{pk}\" - object does not exist.")
            }
            Self::InvalidBody(msg) => write!(f, "Invalid request body: {msg}"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_choice_message() {
        let err = ValidationError::InvalidChoice {
            field: "archived",
            choices: &["both", "false", "true"],
        };
        assert_eq!(err.field(), "archived");
        assert_eq!(err.to_string(), "Must be one of [both, false, true]");
    }

    #[test]
    fn test_missing_object_message() {
        let err = ValidationError::MissingObject {
            field: "user_id",
            pk: "7".to_owned(),
        };
        assert_eq!(err.to_string(), "Invalid pk \"7\" - object does not exist.");
    }

    #[test]
    fn test_immutable_field_message() {
        let err = ValidationError::ImmutableField("organization");
        assert_eq!(err.field(), "organization");
        assert_eq!(err.to_string(), "This field can only be set on creation.");
    }
}

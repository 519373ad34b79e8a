use std::str::FromStr;

use crate::validators::ValidationError;

const CHOICES: &[&str] = &["both", "false", "true"];

fn parse_choice(field: &'static str, value: &str) -> Result<Option<bool>, ValidationError> {
    match value {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        "both" => Ok(None),
        _ => Err(ValidationError::InvalidChoice {
            field,
            choices: CHOICES,
        }),
    }
}

/// The `?archived=` listing filter. Defaults to non-archived rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchivedFilter {
    #[default]
    Unarchived,
    Archived,
    Both,
}

impl ArchivedFilter {
    pub fn matches(self, archived: bool) -> bool {
        match self {
            Self::Unarchived => !archived,
            Self::Archived => archived,
            Self::Both => true,
        }
    }

    /// `None` for `Both`, otherwise the required value of the column.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Unarchived => Some(false),
            Self::Archived => Some(true),
            Self::Both => None,
        }
    }
}

impl FromStr for ArchivedFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match parse_choice("archived", s)? {
            Some(true) => Self::Archived,
            Some(false) => Self::Unarchived,
            None => Self::Both,
        })
    }
}

/// The `?active=` listing filter for users. Defaults to active users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveFilter {
    #[default]
    Active,
    Inactive,
    Both,
}

impl ActiveFilter {
    pub fn matches(self, active: bool) -> bool {
        match self {
            Self::Active => active,
            Self::Inactive => !active,
            Self::Both => true,
        }
    }

    /// The `is_active` value to match, or `None` for both.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Active => Some(true),
            Self::Inactive => Some(false),
            Self::Both => None,
        }
    }
}

impl FromStr for ActiveFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match parse_choice("active", s)? {
            Some(true) => Self::Active,
            Some(false) => Self::Inactive,
            None => Self::Both,
        })
    }
}

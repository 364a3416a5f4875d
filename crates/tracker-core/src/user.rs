//! Tracker users: account holders who file tickets and receive payments.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::UserId;

/// Maximum username length.
pub const USERNAME_MAX: usize = 30;

/// Maximum length of the first and last name.
pub const NAME_MAX: usize = 30;

/// An account that can file tickets and be the counterparty of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerUser {
    /// Identifier.
    pub id: UserId,
    /// Unique login name; also the key of the user's public page.
    pub username: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Staff members review tickets and record transactions.
    #[serde(default)]
    pub is_staff: bool,
}

impl TrackerUser {
    /// Create a non-staff user after validating the username.
    ///
    /// Usernames are 1-30 characters of letters, digits and `@.+-_`.
    pub fn new(username: impl Into<String>) -> Result<Self, ValidationError> {
        let username = username.into();
        validate_username(&username)?;
        Ok(Self {
            id: UserId::new(),
            username,
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
        })
    }

    /// Set the given and family name, trimmed. Each is at most
    /// [`NAME_MAX`] characters.
    pub fn set_name(&mut self, first: &str, last: &str) -> Result<(), ValidationError> {
        let first = first.trim();
        let last = last.trim();
        for (field, value) in [("first_name", first), ("last_name", last)] {
            let len = value.chars().count();
            if len > NAME_MAX {
                return Err(ValidationError::FieldTooLong {
                    field,
                    max: NAME_MAX,
                    actual: len,
                });
            }
        }
        self.first_name = first.to_string();
        self.last_name = last.to_string();
        Ok(())
    }

    /// Full name when known, otherwise the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Path of the user's public page.
    pub fn absolute_url(&self) -> String {
        format!("/user/{}/", self.username)
    }
}

impl std::fmt::Display for TrackerUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Check a username against the account naming rules.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::EmptyField("username"));
    }
    let len = username.chars().count();
    if len > USERNAME_MAX {
        return Err(ValidationError::FieldTooLong {
            field: "username",
            max: USERNAME_MAX,
            actual: len,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(ValidationError::InvalidCharacters("username"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_full_name() {
        let mut user = TrackerUser::new("jana").unwrap();
        assert_eq!(user.display_name(), "jana");
        user.first_name = "Jana".into();
        user.last_name = "Nováková".into();
        assert_eq!(user.display_name(), "Jana Nováková");
        user.last_name.clear();
        assert_eq!(user.display_name(), "Jana");
    }

    #[test]
    fn username_rules() {
        assert!(TrackerUser::new("jana.novakova+wiki@cz").is_ok());
        assert!(TrackerUser::new("").is_err());
        assert!(TrackerUser::new("has space").is_err());
        assert!(TrackerUser::new("x".repeat(31)).is_err());
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        let mut user = TrackerUser::new("jana").unwrap();
        user.set_name(" Jana ", "Nováková").unwrap();
        assert_eq!(user.first_name, "Jana");

        let err = user.set_name("Jana", &"n".repeat(NAME_MAX + 1)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::FieldTooLong {
                field: "last_name",
                max: NAME_MAX,
                actual: NAME_MAX + 1
            }
        );
        assert_eq!(user.last_name, "Nováková", "rejected names leave the user unchanged");
        // Characters, not bytes.
        assert!(user.set_name(&"ř".repeat(NAME_MAX), "").is_ok());
    }

    #[test]
    fn absolute_url_uses_username() {
        let user = TrackerUser::new("jana").unwrap();
        assert_eq!(user.absolute_url(), "/user/jana/");
    }
}

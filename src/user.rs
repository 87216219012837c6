//! The user account record.

use crate::error::{Error, Result};

/// A user account.
///
/// The `password` field holds the bcrypt hash from registration onward; raw
/// passwords exist only transiently inside the register and authenticate
/// paths and are never logged or persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Unique identifier, assigned by the repository on insert.
    pub id: i64,
    /// Unique account name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// bcrypt hash of the account password.
    pub password: String,
}

impl User {
    /// Validates a registration payload.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Validation("empty name".to_string()));
        }
        if self.email.is_empty() {
            return Err(Error::Validation("empty email".to_string()));
        }
        if self.password.is_empty() {
            return Err(Error::Validation("empty password".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: 0,
            name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn complete_user_validates() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let clears: [fn(&mut User); 3] = [
            |u| u.name.clear(),
            |u| u.email.clear(),
            |u| u.password.clear(),
        ];

        for clear in clears {
            let mut user = sample();
            clear(&mut user);
            assert!(matches!(user.validate(), Err(Error::Validation(_))));
        }
    }
}

//! User rows - community members who answer challenges
//!
//! A user is created on registration. Only the activity fields
//! (`is_active`, `last_active`) change afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Store-generated surrogate key
    pub id: i64,
    pub username: String,
    /// Defaults to `true`; nullable in the schema
    pub is_active: Option<bool>,
    /// Last observed activity, maintained by external tracking
    pub last_active: Option<DateTime<Utc>>,
    /// Registration time, defaults to insertion time
    pub joined_at: Option<DateTime<Utc>>,
}

impl User {
    /// A NULL `is_active` is treated as the column default.
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }
}

/// Insert payload for the `users` table.
///
/// `username` is optional here so that an omitted value reaches the store
/// and is rejected there with a constraint violation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub username: Option<String>,
    pub is_active: Option<bool>,
    pub last_active: Option<DateTime<Utc>>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl NewUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    pub fn with_last_active(mut self, at: DateTime<Utc>) -> Self {
        self.last_active = Some(at);
        self
    }

    pub fn with_joined_at(mut self, at: DateTime<Utc>) -> Self {
        self.joined_at = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_active_reads_as_default() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            is_active: None,
            last_active: None,
            joined_at: None,
        };
        assert!(user.is_active());
    }

    #[test]
    fn test_new_user_builder() {
        let new = NewUser::new("bob").with_active(false);
        assert_eq!(new.username.as_deref(), Some("bob"));
        assert_eq!(new.is_active, Some(false));
        assert!(new.joined_at.is_none());
    }
}

//! Registered marketplace users

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Chat-platform user identifier
///
/// `0` is reserved for [`crate::types::EXTERNAL_ACCOUNT`].
pub type UserId = u64;

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub joined_at: DateTime<Utc>,
    /// Refreshed on every command the user issues
    pub last_active: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, username: &str, now: DateTime<Utc>) -> Self {
        User {
            id,
            username: username.to_string(),
            joined_at: now,
            last_active: now,
        }
    }
}

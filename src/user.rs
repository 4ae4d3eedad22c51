use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "backend-sql", derive(sqlx::Type), sqlx(transparent))]
pub struct UserId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "backend-sql", derive(sqlx::FromRow))]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: String, // plaintext
}

/// A user record before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

impl fmt::Display for UserId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

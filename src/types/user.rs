use chrono::{DateTime, Utc};

pub type UserId = i64;

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Salted digest, never the raw password.
    pub password: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

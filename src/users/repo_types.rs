use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,      // Argon2 PHC string, never exposed
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub resume_key: Option<String>, // storage key of the current resume
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Values needed to insert a new user row.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

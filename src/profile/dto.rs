use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::User;

/// `PUT /api/profile` body. Carrying either password field turns the request
/// into a password change; otherwise the provided names are updated.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

impl ProfileUpdateRequest {
    pub fn is_password_change(&self) -> bool {
        self.current_password.is_some() || self.new_password.is_some()
    }
}

/// Full profile as seen by its owner.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub resume_url: Option<String>,
}

impl From<&User> for ProfileView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            resume_url: u.resume_key.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ProfileView>,
}

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::dto::SignupRequest;
use super::password::{
    hash_password, is_strong_enough, verify_against_dummy, verify_password, MIN_PASSWORD_LEN,
};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::users::{NewUser, User};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Blank names are stored as absent.
fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub async fn signup(state: &AppState, req: &SignupRequest) -> AppResult<User> {
    let email = req.email.trim();

    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    if !is_strong_enough(&req.password) {
        warn!("password too short");
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if state.users.find_by_email(email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateUser);
    }

    let hash = hash_password(&req.password)?;
    let user = state
        .users
        .create(NewUser {
            email,
            password_hash: &hash,
            first_name: non_blank(&req.first_name),
            last_name: non_blank(&req.last_name),
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Unknown email and wrong password fail identically.
pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<User> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let Some(user) = state.users.find_by_email(email).await? else {
        verify_against_dummy(password);
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

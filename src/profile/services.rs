use tracing::{info, warn};

use crate::auth::password::{hash_password, is_strong_enough, verify_password, MIN_PASSWORD_LEN};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::users::User;

/// Names are trimmed; a blank name clears the stored one.
pub async fn update_profile(
    state: &AppState,
    user: &User,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> AppResult<User> {
    let first_name = first_name.map(str::trim);
    let last_name = last_name.map(str::trim);

    let updated = state
        .users
        .update_names(user.id, first_name, last_name)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, "profile updated");
    Ok(updated)
}

/// A wrong current password leaves the stored hash untouched.
pub async fn change_password(
    state: &AppState,
    user: &User,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    if !verify_password(current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(AppError::InvalidCredentials);
    }
    if !is_strong_enough(new_password) {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let hash = hash_password(new_password)?;
    if !state.users.update_password_hash(user.id, &hash).await? {
        return Err(AppError::NotFound("User not found".into()));
    }

    info!(user_id = %user.id, "password changed");
    Ok(())
}

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use super::session::SessionKeys;
use crate::{error::AppError, state::AppState, users::User};

/// The authenticated caller, resolved from the session cookie (or a bearer
/// token) and re-read from the store on every request.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let keys = SessionKeys::from_ref(state);
        let token =
            session_token(&parts.headers, &keys.cookie_name).ok_or(AppError::Unauthorized)?;

        let claims = keys.verify(&token).map_err(|e| {
            debug!(error = %e, "rejected session token");
            AppError::Unauthorized
        })?;

        match state.users.find_by_id(claims.sub).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                warn!(user_id = %claims.sub, "session refers to missing user");
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Cookie first, then `Authorization: Bearer <token>`.
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};

    #[test]
    fn token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=abc"));
        assert_eq!(session_token(&headers, "session").as_deref(), Some("abc"));
    }

    #[test]
    fn token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers, "session").as_deref(), Some("xyz"));
    }

    #[test]
    fn empty_cookie_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_token(&headers, "session"), None);
    }

    #[tokio::test]
    async fn rejects_missing_and_invalid_tokens() {
        let state = AppState::fake();

        let req = axum::http::Request::builder().body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized));

        let req = axum::http::Request::builder()
            .header(COOKIE, "session=garbage")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn rejects_token_for_deleted_user() {
        let state = AppState::fake();
        let token = SessionKeys::from_ref(&state).sign(uuid::Uuid::new_v4()).unwrap();
        let req = axum::http::Request::builder()
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized));
    }
}

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::SESSION_COOKIE;
use crate::errors::AppError;
use crate::models::UserRow;
use crate::state::AppState;
use crate::store::sessions;

/// The signed-in user, if the request carries a live session cookie.
pub struct MaybeUser(pub Option<UserRow>);

/// Like [`MaybeUser`] but rejects anonymous requests with 401.
pub struct RequireUser(pub UserRow);

pub(crate) fn session_token(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts) else {
            return Ok(MaybeUser(None));
        };
        Ok(MaybeUser(sessions::find_user(&state.db, &token).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(RequireUser(user)),
            MaybeUser(None) => Err(AppError::Unauthorized),
        }
    }
}

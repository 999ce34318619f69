use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::{login_cookie, logout_cookie, MaybeUser, MIN_PASSWORD_LEN, SESSION_COOKIE};
use crate::errors::AppError;
use crate::models::PublicUser;
use crate::state::AppState;
use crate::store::{sessions, users};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub ok: bool,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<PublicUser>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "email and password (>={MIN_PASSWORD_LEN}) required"
        )));
    }
    if users::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let hash = hash_password_blocking(req.password).await?;
    let user = match users::create(&state.db, &email, &hash, name).await {
        Ok(user) => user,
        // Lost a race with a concurrent registration of the same email.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict("User already exists".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let token = sessions::create(&state.db, user.id).await?;
    let jar = jar.add(login_cookie(&token, state.config.cookie_secure)?);
    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            ok: true,
            user: user.into(),
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "email and password required".to_string(),
        ));
    }

    let Some(user) = users::find_by_email(&state.db, &email).await? else {
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }

    let token = sessions::create(&state.db, user.id).await?;
    let jar = jar.add(login_cookie(&token, state.config.cookie_secure)?);
    info!("User {} logged in", user.id);

    Ok((
        jar,
        Json(AuthResponse {
            ok: true,
            user: user.into(),
        }),
    ))
}

/// POST /api/v1/auth/logout
///
/// Always succeeds; the cookie is expired even when the session is unknown.
pub async fn handle_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<OkResponse>), AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty());
    if let Some(token) = token {
        sessions::delete(&state.db, &token).await?;
    }
    let jar = jar.add(logout_cookie(state.config.cookie_secure)?);
    Ok((jar, Json(OkResponse { ok: true })))
}

/// GET /api/v1/auth/me
pub async fn handle_me(MaybeUser(user): MaybeUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: user.map(PublicUser::from),
    })
}

use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use tracing::info;
use uuid::Uuid;

use warbler_db::Database;
use warbler_db::models::NewUser;
use warbler_types::User;
use warbler_types::api::{AuthResponse, Claims, LoginRequest, SignupRequest};

use crate::error::{ApiError, blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

pub(crate) const MAX_USERNAME_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 6;

/// Creates an account with an Argon2id-hashed password.
///
/// A taken username or email surfaces as
/// `ApiError::Store(StoreError::UniquenessViolation)`.
pub fn signup(
    db: &Database,
    username: &str,
    email: &str,
    password: &str,
    image_url: Option<&str>,
) -> Result<User, ApiError> {
    let username = validate_username(username)?;
    let email = email.trim();
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address.".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }

    let password_hash = hash_password(password)?;
    let row = db.create_user(&NewUser {
        email,
        username,
        password_hash: &password_hash,
        image_url,
    })?;

    info!("New user {} ({})", row.username, row.id);
    Ok(row.into_user())
}

/// Looks the user up by username and checks the password. Unknown users and
/// wrong passwords both give `Ok(None)`; only infrastructure failures are
/// errors.
pub fn authenticate(db: &Database, username: &str, password: &str) -> Result<Option<User>, ApiError> {
    // Stored usernames are trimmed at signup.
    let Some(row) = db.get_user_by_username(username.trim())? else {
        return Ok(None);
    };

    if verify_password(password, &row.password)? {
        Ok(Some(row.into_user()))
    } else {
        Ok(None)
    }
}

/// Trims `username` and checks it is 1..=`MAX_USERNAME_LEN` characters.
pub(crate) fn validate_username(username: &str) -> Result<&str, ApiError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Username must be 1 to {MAX_USERNAME_LEN} characters."
        )));
    }
    Ok(username)
}

pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

pub(crate) fn verify_password(password: &str, stored: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| ApiError::Internal(format!("corrupt password hash: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(format!("password verification failed: {e}"))),
    }
}

pub fn create_token(secret: &str, ttl_days: i64, user_id: Uuid, username: &str) -> Result<String, ApiError> {
    let exp = TimeDelta::try_days(ttl_days)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| ApiError::Internal(format!("token lifetime of {ttl_days} days is out of range")))?;

    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: exp.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))
}

pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

// -- Handlers --

pub async fn signup_handler(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let user = blocking(move || {
        signup(
            &st.db,
            &req.username,
            &req.email,
            &req.password,
            req.image_url.as_deref(),
        )
    })
    .await?;

    let token = create_token(&state.jwt_secret, state.token_ttl_days, user.id, &user.username)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let user = blocking(move || authenticate(&st.db, &req.username, &req.password))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let token = create_token(&state.jwt_secret, state.token_ttl_days, user.id, &user.username)?;

    Ok(Json(AuthResponse { user, token }))
}

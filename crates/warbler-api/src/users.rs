use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use warbler_db::models::{UserChanges, UserRow};
use warbler_types::api::{ProfileResponse, ProfileUpdateRequest, UserSearchQuery};
use warbler_types::{Actor, User};

use crate::auth::{AppState, validate_username, verify_password};
use crate::authz;
use crate::error::{ApiError, blocking};

/// Messages shown on a profile page.
const PROFILE_MESSAGE_LIMIT: u32 = 100;

fn into_users(rows: Vec<UserRow>) -> Vec<User> {
    rows.into_iter().map(UserRow::into_user).collect()
}

/// GET /users?q=
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let needle = query.q.filter(|q| !q.trim().is_empty());
    let rows = blocking(move || Ok(state.db.search_users(needle.as_deref())?)).await?;
    Ok(Json(into_users(rows)))
}

/// GET /users/{user_id}. Public, no login needed.
pub async fn show_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = blocking(move || {
        let user = state
            .db
            .get_user_by_id(user_id)?
            .ok_or(ApiError::NotFound("User"))?
            .into_user();
        let message_count = state.db.message_count(user_id)?;
        let (following_count, followers_count) = state.db.follow_counts(user_id)?;
        let likes_count = state.db.likes_count(user_id)?;
        let messages = state
            .db
            .messages_by_user(user_id, PROFILE_MESSAGE_LIMIT)?
            .into_iter()
            .map(|row| row.into_message())
            .collect();

        Ok(ProfileResponse {
            user,
            message_count,
            following_count,
            followers_count,
            likes_count,
            messages,
        })
    })
    .await?;

    Ok(Json(profile))
}

/// GET /users/{user_id}/followers
pub async fn followers(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    authz::ensure(authz::can_view_follow_list(&actor))?;

    let rows = blocking(move || {
        state
            .db
            .get_user_by_id(user_id)?
            .ok_or(ApiError::NotFound("User"))?;
        Ok(state.db.followers(user_id)?)
    })
    .await?;

    Ok(Json(into_users(rows)))
}

/// GET /users/{user_id}/following
pub async fn following(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    authz::ensure(authz::can_view_follow_list(&actor))?;

    let rows = blocking(move || {
        state
            .db
            .get_user_by_id(user_id)?
            .ok_or(ApiError::NotFound("User"))?;
        Ok(state.db.following(user_id)?)
    })
    .await?;

    Ok(Json(into_users(rows)))
}

/// GET /users/{user_id}/likes: messages the user has liked, latest like
/// first.
pub async fn likes(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(move || {
        state
            .db
            .get_user_by_id(user_id)?
            .ok_or(ApiError::NotFound("User"))?;
        Ok(state.db.liked_messages(user_id, PROFILE_MESSAGE_LIMIT)?)
    })
    .await?;

    let messages: Vec<_> = rows.into_iter().map(|row| row.into_message()).collect();
    Ok(Json(messages))
}

/// POST /users/follow/{user_id}
pub async fn follow(
    State(state): State<AppState>,
    Path(followed_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    authz::ensure(authz::can_follow(&actor))?;
    let me = authz::require_user(&actor)?;

    let edge = blocking(move || Ok(state.db.follow(me, followed_id)?)).await?;
    info!("{} now follows {}", edge.follower_id, edge.followed_id);
    Ok((StatusCode::CREATED, Json(edge)))
}

/// POST /users/stop-following/{user_id}. Succeeds even when no edge existed.
pub async fn stop_following(
    State(state): State<AppState>,
    Path(followed_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    authz::ensure(authz::can_follow(&actor))?;
    let me = authz::require_user(&actor)?;

    blocking(move || Ok(state.db.unfollow(me, followed_id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /users/profile. Requires the current password. An empty `bio` or
/// `location` clears it.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::ensure(authz::can_edit_profile(&actor))?;
    let me = authz::require_user(&actor)?;
    let Json(req) = body?;

    if let Some(username) = req.username.as_deref() {
        validate_username(username)?;
    }
    if req.email.as_deref().is_some_and(|e| !e.contains('@')) {
        return Err(ApiError::BadRequest("Invalid email address.".into()));
    }

    let user = blocking(move || {
        let row = state
            .db
            .get_user_by_id(me)?
            .ok_or(ApiError::Unauthorized)?;
        if !verify_password(&req.password, &row.password)? {
            return Err(ApiError::Unauthorized);
        }

        let changes = UserChanges {
            email: req.email.as_deref().map(str::trim),
            username: req.username.as_deref().map(str::trim),
            image_url: req.image_url.as_deref(),
            header_image_url: req.header_image_url.as_deref(),
            bio: req.bio.as_deref().map(str::trim),
            location: req.location.as_deref().map(str::trim),
        };

        state
            .db
            .update_user(me, &changes)?
            .map(UserRow::into_user)
            .ok_or(ApiError::Unauthorized)
    })
    .await?;

    Ok(Json(user))
}

/// POST /users/delete: removes the actor's account, messages, likes and
/// follow edges.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    authz::ensure(authz::can_delete_account(&actor))?;
    let me = authz::require_user(&actor)?;

    let deleted = blocking(move || Ok(state.db.delete_user(me)?)).await?;
    if !deleted {
        return Err(ApiError::NotFound("User"));
    }

    info!("Account {} closed", me);
    Ok(StatusCode::NO_CONTENT)
}

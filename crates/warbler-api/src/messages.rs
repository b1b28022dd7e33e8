use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use warbler_db::messages::TIMELINE_LIMIT;
use warbler_types::Actor;
use warbler_types::api::{LikeResponse, NewMessageRequest};

use crate::auth::AppState;
use crate::authz;
use crate::error::{ApiError, blocking};

/// POST /messages/new
///
/// The body is parsed after the authorization check, so an anonymous caller
/// gets "Access unauthorized." whatever it sent.
pub async fn new_message(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<NewMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::ensure(authz::can_post(&actor))?;
    let user_id = authz::require_user(&actor)?;
    let Json(req) = body?;

    let message = blocking(move || Ok(state.db.insert_message(user_id, &req.text)?))
        .await?
        .into_message();

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /messages/{message_id}
pub async fn show_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(move || Ok(state.db.get_message(message_id)?))
        .await?
        .ok_or(ApiError::NotFound("Message"))?
        .into_message();

    Ok(Json(message))
}

/// POST /messages/{message_id}/delete
///
/// Anonymous callers are turned away before the message is even looked up,
/// so they learn nothing about which ids exist.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require_user(&actor)?;

    let st = state.clone();
    let message = blocking(move || Ok(st.db.get_message(message_id)?))
        .await?
        .ok_or(ApiError::NotFound("Message"))?
        .into_message();

    authz::ensure(authz::can_delete(&actor, &message))?;

    blocking(move || Ok(state.db.delete_message(message_id)?)).await?;
    info!("Message {} deleted by its owner {}", message.id, message.user_id);

    Ok(StatusCode::NO_CONTENT)
}

/// POST /messages/{message_id}/handle-like: likes the message, or unlikes it
/// if the actor already did.
pub async fn handle_like(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    authz::ensure(authz::can_post(&actor))?;
    let me = authz::require_user(&actor)?;

    let resp = blocking(move || {
        state
            .db
            .get_message(message_id)?
            .ok_or(ApiError::NotFound("Message"))?;
        let liked = state.db.toggle_like(me, message_id)?;
        let count = state.db.likes_count(me)?;
        Ok(LikeResponse { liked, count })
    })
    .await?;

    Ok(Json(resp))
}

/// GET /timeline: the actor's messages plus those of everyone they follow.
pub async fn timeline(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authz::require_user(&actor)?;

    let rows = blocking(move || Ok(state.db.timeline(user_id, TIMELINE_LIMIT)?)).await?;
    let messages: Vec<_> = rows.into_iter().map(|row| row.into_message()).collect();

    Ok(Json(messages))
}

//! Who may do what. Every rule is a pure predicate over the request's
//! [`Actor`]; handlers check the rule before touching the database, so a
//! denied request never writes anything.

use uuid::Uuid;

use warbler_types::{Actor, Message};

use crate::error::ApiError;

pub fn can_post(actor: &Actor) -> bool {
    actor.is_authenticated()
}

/// Only the author may delete a message.
pub fn can_delete(actor: &Actor, message: &Message) -> bool {
    actor.user_id() == Some(message.user_id)
}

pub fn can_view_follow_list(actor: &Actor) -> bool {
    actor.is_authenticated()
}

pub fn can_follow(actor: &Actor) -> bool {
    actor.is_authenticated()
}

pub fn can_edit_profile(actor: &Actor) -> bool {
    actor.is_authenticated()
}

pub fn can_delete_account(actor: &Actor) -> bool {
    actor.is_authenticated()
}

pub fn ensure(allowed: bool) -> Result<(), ApiError> {
    if allowed { Ok(()) } else { Err(ApiError::Unauthorized) }
}

/// The acting user's id, or `Unauthorized` for anonymous requests.
pub fn require_user(actor: &Actor) -> Result<Uuid, ApiError> {
    actor.user_id().ok_or(ApiError::Unauthorized)
}

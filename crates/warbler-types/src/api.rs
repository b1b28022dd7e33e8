use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, User};

// -- JWT Claims --

/// Bearer token claims. `sub` is the user id the token was issued to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned by both signup and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    pub q: Option<String>,
}

/// Partial profile edit. Absent fields are left alone; an empty `bio` or
/// `location` clears it. `password` must be the account's current password.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdateRequest {
    pub password: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
    pub message_count: u64,
    pub following_count: u64,
    pub followers_count: u64,
    /// Messages this user has liked.
    pub likes_count: u64,
    pub messages: Vec<Message>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMessageRequest {
    pub text: String,
}

/// Result of toggling a like. `count` is how many messages the actor now
/// likes.
#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_image_url_is_optional() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"username":"liz","email":"liz@liz.com","password":"password"}"#,
        )
        .unwrap();
        assert_eq!(req.username, "liz");
        assert!(req.image_url.is_none());
    }

    #[test]
    fn new_message_rejects_unknown_fields() {
        let res = serde_json::from_str::<NewMessageRequest>(r#"{"text":"hi","user_id":"x"}"#);
        assert!(res.is_err());
    }
}

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::{debug, error};

use warbler_types::Actor;

use crate::auth::{AppState, decode_token};

/// Resolves the request's [`Actor`] from an optional bearer token and stores
/// it as a request extension.
///
/// A missing, invalid or expired token, or a token for an account that no
/// longer exists, yields `Actor::Anonymous`. Rejection is left to the
/// handlers.
pub async fn resolve_actor(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let claims = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .and_then(|auth| decode_token(&state.jwt_secret, auth.token()));

    let actor = match claims {
        Some(claims) => {
            let st = state.clone();
            let user_id = claims.sub;
            match tokio::task::spawn_blocking(move || st.db.get_user_by_id(user_id)).await {
                Ok(Ok(Some(_))) => Actor::User(user_id),
                Ok(Ok(None)) => {
                    debug!("Token for deleted user {}", user_id);
                    Actor::Anonymous
                }
                Ok(Err(e)) => {
                    error!("Actor lookup failed: {}", e);
                    Actor::Anonymous
                }
                Err(e) => {
                    error!("spawn_blocking join error: {}", e);
                    Actor::Anonymous
                }
            }
        }
        None => Actor::Anonymous,
    };

    req.extensions_mut().insert(actor);
    next.run(req).await
}

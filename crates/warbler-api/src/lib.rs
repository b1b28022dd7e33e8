pub mod auth;
pub mod authz;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::auth::AppState;

/// Builds every route. Routes under the actor layer see an
/// `Extension<Actor>`; signup, login and health do not need one.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/signup", post(auth::signup_handler))
        .route("/login", post(auth::login_handler))
        .route("/health", get(health));

    let actor_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::show_user))
        .route("/users/{user_id}/followers", get(users::followers))
        .route("/users/{user_id}/following", get(users::following))
        .route("/users/{user_id}/likes", get(users::likes))
        .route("/users/follow/{user_id}", post(users::follow))
        .route("/users/stop-following/{user_id}", post(users::stop_following))
        .route("/users/profile", patch(users::update_profile))
        .route("/users/delete", post(users::delete_account))
        .route("/messages/new", post(messages::new_message))
        .route("/messages/{message_id}", get(messages::show_message))
        .route("/messages/{message_id}/delete", post(messages::delete_message))
        .route("/messages/{message_id}/handle-like", post(messages::handle_like))
        .route("/timeline", get(messages::timeline))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_actor,
        ));

    Router::new()
        .merge(public_routes)
        .merge(actor_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

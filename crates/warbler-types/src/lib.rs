pub mod actor;
pub mod api;
pub mod models;

pub use actor::Actor;
pub use models::{Follow, Message, User};

/// Longest message text accepted, in characters.
pub const MAX_MESSAGE_LEN: usize = 140;

/// Image shown for users who never set one.
pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";

/// Header image shown for users who never set one.
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

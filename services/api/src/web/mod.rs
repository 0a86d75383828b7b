pub mod rest;
pub mod sessions;
pub mod state;

// Re-export the handlers the binary wires into the router.
pub use rest::{
    health_handler, list_exercises_handler, list_texts_handler, register_text_handler,
    text_content_handler, toggle_favorite_handler,
};
pub use sessions::{complete_session_handler, create_session_handler, list_sessions_handler};

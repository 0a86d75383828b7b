//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use narratype_core::catalog::Reconciler;
use narratype_core::ports::DatabaseService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Handlers that touch the filesystem go through the reconciler; plain
/// session CRUD talks to the store directly.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DatabaseService>,
    pub reconciler: Arc<Reconciler>,
    pub config: Arc<Config>,
}

use std::sync::Arc;

use temu_core::onboarding::{PersistenceSynchronizer, WriteGate};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Loads and saves wizard progress against the configured profile store.
    pub sync: PersistenceSynchronizer,
    /// Single-writer permits per `(user, role)` wizard.
    pub write_gate: Arc<WriteGate>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

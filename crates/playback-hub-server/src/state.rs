//! Shared application state.

use crate::session_manager::SessionManager;

/// Shared state for Actix handlers.
pub struct AppState {
    /// Per-key scheduler registry.
    pub sessions: SessionManager,
    /// Queue listing page size.
    pub page_size: usize,
}

impl AppState {
    pub fn new(sessions: SessionManager, page_size: usize) -> Self {
        Self {
            sessions,
            page_size,
        }
    }
}

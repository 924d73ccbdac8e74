//! Server state management
//!
//! The room store is injected so tests and alternative backends can swap it.

use std::sync::Arc;
use uttt_sync::{MemoryRoomStore, RoomStore};

/// Server-wide shared state
pub struct ServerState {
    pub store: Arc<dyn RoomStore>,
}

impl ServerState {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryRoomStore::new()))
    }

    pub fn with_store(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

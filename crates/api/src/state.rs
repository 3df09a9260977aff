use std::sync::Arc;

use vstack_core::registry::ResourceRegistry;
use vstack_db::RecordStore;
use vstack_events::NotificationInbox;

use crate::background::import_worker::ImportQueue;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc` or is a channel handle.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for every resource table.
    pub store: Arc<dyn RecordStore>,
    /// Registered resources, immutable after startup.
    pub registry: Arc<ResourceRegistry>,
    pub config: Arc<ServerConfig>,
    /// Recent notifications per user, fed from the bus.
    pub inbox: Arc<NotificationInbox>,
    pub import_queue: ImportQueue,
}

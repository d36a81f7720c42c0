use std::sync::Arc;

use tokio::sync::Mutex;

use crate::documents::DocumentStore;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<DocumentStore>>,
    /// Collection holding one document per batch.
    pub manufacturing_collection: Arc<str>,
}

impl AppState {
    pub fn new(store: DocumentStore, manufacturing_collection: &str) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            manufacturing_collection: Arc::from(manufacturing_collection),
        }
    }
}

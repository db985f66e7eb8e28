use crate::analyzer::Analyzer;
use crate::predict::Pipeline;
use crate::store::SessionStore;
use crate::upload::TransientStorage;
use std::sync::Arc;

/// Shared application state for HTTP handlers.
///
/// Collaborators are built once by the entry point and injected here;
/// handlers share no mutable state.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<TransientStorage>,
    pub pipeline: Pipeline,
    pub store: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(
        storage: TransientStorage,
        analyzer: Arc<dyn Analyzer>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            storage: Arc::new(storage),
            pipeline: Pipeline::new(analyzer, Arc::clone(&store)),
            store,
        }
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{config::AppConfig, document_store::DocumentStore, generator::ResponseGenerator};

/// Estado compartido entre handlers. Nada aquí es mutable: cada petición
/// trabaja con sus propios datos.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn DocumentStore>,
    pub generator: Arc<ResponseGenerator>,
    pub started_at: DateTime<Utc>,
}

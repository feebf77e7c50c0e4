use std::sync::Arc;

use crate::application::ports::SessionStorePort;
use crate::application::services::InspectionService;

/// Estado compartido para los manejadores HTTP de Axum.
#[derive(Clone)]
pub struct HttpState {
    /// Orquestador de la inspección de daños.
    pub inspection: Arc<InspectionService>,
    /// Resolución de tokens a identidades.
    pub sessions: Arc<dyn SessionStorePort>,
}

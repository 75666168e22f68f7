pub mod config;
pub mod policy;
pub mod rest;
pub mod topology;

use std::sync::Arc;

use config::DaemonConfig;
use topology::store::TopologyStore;

/// Shared application state passed to every REST handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    pub store: Arc<TopologyStore>,
    pub started_at: std::time::Instant,
}

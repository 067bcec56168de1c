pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;

use {adapters::auth::JwtVerifier, services::ReconciliationEngine, std::sync::Arc};

#[derive(Clone)]
pub struct AppState {
    pub engine: ReconciliationEngine,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(engine: ReconciliationEngine, jwt_secret: &str) -> Self {
        Self {
            engine,
            jwt: Arc::new(JwtVerifier::new(jwt_secret)),
        }
    }
}

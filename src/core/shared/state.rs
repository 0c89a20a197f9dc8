use crate::core::config::AppConfig;
use crate::core::shared::utils::DbPool;
use crate::security::jwt::{JwtConfig, JwtManager};
use std::sync::Arc;

pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(conn: DbPool, config: AppConfig) -> Result<Self, anyhow::Error> {
        let jwt = JwtManager::new(JwtConfig::from(&config.auth), &config.auth.jwt_secret)?;
        Ok(Self {
            conn,
            config,
            jwt: Arc::new(jwt),
        })
    }

    pub fn pass_percentage(&self) -> f64 {
        self.config.learning.pass_percentage
    }
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            config: self.config.clone(),
            jwt: Arc::clone(&self.jwt),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("server", &self.config.server)
            .field("pool_size", &self.config.database.pool_size)
            .finish_non_exhaustive()
    }
}

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::core::config::ServerConfig;

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "Accept".to_string(),
                "Accept-Language".to_string(),
            ],
            allow_credentials: true,
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    pub fn from_server_config(server: &ServerConfig) -> Self {
        Self::default().with_origins(server.cors_origins.clone())
    }

    pub fn with_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins
            .into_iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        self
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    pub fn build(self) -> CorsLayer {
        let mut cors = CorsLayer::new()
            .allow_methods(self.allowed_methods.clone())
            .max_age(std::time::Duration::from_secs(self.max_age_secs));

        let headers: Vec<header::HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors = cors.allow_headers(headers);

        if self.allows_any_origin() {
            // Credentials cannot be combined with a wildcard origin.
            info!("CORS allows any origin");
            return cors.allow_origin(AllowOrigin::predicate(validate_origin));
        }

        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if origins.is_empty() {
            warn!("No valid CORS origins configured, cross-origin requests will be rejected");
        } else {
            info!("CORS configured with {} allowed origins", origins.len());
        }

        cors = cors.allow_origin(origins);
        if self.allow_credentials {
            cors = cors.allow_credentials(true);
        }
        cors
    }
}

pub fn create_cors_layer(server: &ServerConfig) -> CorsLayer {
    CorsConfig::from_server_config(server).build()
}

fn validate_origin(origin: &HeaderValue, _request: &axum::http::request::Parts) -> bool {
    origin.to_str().map(is_valid_origin_format).unwrap_or(false)
}

fn is_valid_origin_format(origin: &str) -> bool {
    if !origin.starts_with("http://") && !origin.starts_with("https://") {
        return false;
    }

    let origin_lower = origin.to_lowercase();
    !["<script", "javascript:", "data:", "%3c", "%3e"]
        .iter()
        .any(|pattern| origin_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origins_are_normalized() {
        let config = CorsConfig::default().with_origins(vec![
            " http://localhost:5173/ ".to_string(),
            "".to_string(),
        ]);
        assert_eq!(config.allowed_origins, vec!["http://localhost:5173"]);
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_wildcard_detection() {
        let config = CorsConfig::default().with_origins(vec!["*".to_string()]);
        assert!(config.allows_any_origin());
        let _layer = config.build();
    }

    #[test]
    fn test_origin_format() {
        assert!(is_valid_origin_format("https://toeic.example.vn"));
        assert!(!is_valid_origin_format("javascript:alert(1)"));
        assert!(!is_valid_origin_format("ftp://example.com"));
    }

    #[test]
    fn test_build_from_server_config() {
        let _layer = create_cors_layer(&ServerConfig::default());
    }
}

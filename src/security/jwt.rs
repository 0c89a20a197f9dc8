use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::core::config::AuthConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
    pub leeway_seconds: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: "toeic-server".into(),
            audience: "toeic-web".into(),
            access_token_expiry_minutes: 60,
            refresh_token_expiry_days: 7,
            leeway_seconds: 60,
        }
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            issuer: auth.issuer.clone(),
            audience: auth.audience.clone(),
            access_token_expiry_minutes: auth.access_token_minutes,
            refresh_token_expiry_days: auth.refresh_token_days,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        issuer: &str,
        audience: &str,
        token_type: TokenType,
        expiry: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.as_str().to_string(),
            email: None,
            roles: None,
        }
    }

    pub fn with_email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = Some(roles);
        self
    }

    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid user ID in claims: {e}"))
    }

    pub fn is_access_token(&self) -> bool {
        self.token_type == TokenType::Access.as_str()
    }

    pub fn is_refresh_token(&self) -> bool {
        self.token_type == TokenType::Refresh.as_str()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Revoked jti mapped to the token's expiry timestamp.
    revoked: Arc<RwLock<HashMap<String, i64>>>,
}

impl JwtManager {
    pub fn new(config: JwtConfig, secret: &str) -> Result<Self> {
        if secret.len() < 32 {
            return Err(anyhow!("JWT secret must be at least 32 characters"));
        }

        Ok(Self {
            config,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            revoked: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn from_secret(secret: &str) -> Result<Self> {
        Self::new(JwtConfig::default(), secret)
    }

    fn encode(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to encode {} token: {e}", claims.token_type))
    }

    pub fn generate_token_pair(
        &self,
        user_id: Uuid,
        email: &str,
        roles: Vec<String>,
    ) -> Result<TokenPair> {
        let now = Utc::now();
        let access_expiry = now + Duration::minutes(self.config.access_token_expiry_minutes);
        let refresh_expiry = now + Duration::days(self.config.refresh_token_expiry_days);

        let access_claims = Claims::new(
            user_id,
            &self.config.issuer,
            &self.config.audience,
            TokenType::Access,
            access_expiry,
        )
        .with_email(email.to_string())
        .with_roles(roles);

        let refresh_claims = Claims::new(
            user_id,
            &self.config.issuer,
            &self.config.audience,
            TokenType::Refresh,
            refresh_expiry,
        );

        Ok(TokenPair {
            access_token: self.encode(&access_claims)?,
            refresh_token: self.encode(&refresh_claims)?,
            token_type: "Bearer".into(),
            expires_in: self.config.access_token_expiry_minutes * 60,
            refresh_expires_in: self.config.refresh_token_expiry_days * 24 * 60 * 60,
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.leeway = self.config.leeway_seconds;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| anyhow!("Token validation failed: {e}"))
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if !claims.is_access_token() {
            return Err(anyhow!("Token is not an access token"));
        }
        Ok(claims)
    }

    pub async fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if !claims.is_refresh_token() {
            return Err(anyhow!("Token is not a refresh token"));
        }
        if self.is_revoked(&claims.jti).await {
            return Err(anyhow!("Refresh token has been revoked"));
        }
        Ok(claims)
    }

    /// Marks the token as used. Returns `false` when it was already revoked,
    /// so exactly one caller wins for a given jti.
    pub async fn try_revoke(&self, claims: &Claims) -> bool {
        let now = Utc::now().timestamp();
        let leeway = self.config.leeway_seconds as i64;
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp + leeway >= now);
        let fresh = revoked.insert(claims.jti.clone(), claims.exp).is_none();
        if fresh {
            debug!("Revoked token {}", claims.jti);
        }
        fresh
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.read().await.contains_key(jti)
    }

    #[cfg(test)]
    async fn revoked_count(&self) -> usize {
        self.revoked.read().await.len()
    }
}

pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_manager() -> JwtManager {
        JwtManager::from_secret("this-is-a-very-long-secret-key-for-testing-purposes-only")
            .expect("Failed to create manager")
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtManager::from_secret("too-short").is_err());
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let manager = create_test_manager();
        let user_id = Uuid::new_v4();

        let pair = manager
            .generate_token_pair(user_id, "lan@example.com", vec!["hoc_vien".into()])
            .expect("Failed to generate");
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 3600);

        let claims = manager
            .validate_access_token(&pair.access_token)
            .expect("Validation failed");
        assert_eq!(claims.user_id().expect("Invalid user ID"), user_id);
        assert_eq!(claims.email.as_deref(), Some("lan@example.com"));
        assert_eq!(claims.roles, Some(vec!["hoc_vien".to_string()]));
    }

    #[tokio::test]
    async fn test_wrong_token_type() {
        let manager = create_test_manager();
        let pair = manager
            .generate_token_pair(Uuid::new_v4(), "a@example.com", vec![])
            .expect("Failed to generate");

        assert!(manager.validate_access_token(&pair.refresh_token).is_err());
        assert!(manager.validate_refresh_token(&pair.access_token).await.is_err());
        assert!(manager.validate_refresh_token(&pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoked_refresh_token() {
        let manager = create_test_manager();
        let pair = manager
            .generate_token_pair(Uuid::new_v4(), "a@example.com", vec![])
            .expect("Failed to generate");

        let claims = manager
            .validate_refresh_token(&pair.refresh_token)
            .await
            .expect("Validation failed");
        assert!(manager.try_revoke(&claims).await);
        assert!(!manager.try_revoke(&claims).await);

        assert!(manager.validate_refresh_token(&pair.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_revocations_have_one_winner() {
        let manager = Arc::new(create_test_manager());
        let pair = manager
            .generate_token_pair(Uuid::new_v4(), "a@example.com", vec![])
            .expect("Failed to generate");

        let exchange = |manager: Arc<JwtManager>, token: String| async move {
            let claims = manager.validate_refresh_token(&token).await.ok()?;
            tokio::task::yield_now().await;
            manager.try_revoke(&claims).await.then_some(())
        };

        let (first, second) = tokio::join!(
            exchange(Arc::clone(&manager), pair.refresh_token.clone()),
            exchange(Arc::clone(&manager), pair.refresh_token.clone()),
        );
        assert_eq!(
            [first.is_some(), second.is_some()]
                .iter()
                .filter(|won| **won)
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_expired_revocations_are_pruned() {
        let manager = create_test_manager();
        let mut stale = Claims::new(
            Uuid::new_v4(),
            "toeic-server",
            "toeic-web",
            TokenType::Refresh,
            Utc::now() - Duration::days(1),
        );
        assert!(manager.try_revoke(&stale).await);
        assert_eq!(manager.revoked_count().await, 1);

        stale.jti = Uuid::new_v4().to_string();
        stale.exp = (Utc::now() + Duration::days(1)).timestamp();
        assert!(manager.try_revoke(&stale).await);
        assert_eq!(manager.revoked_count().await, 1);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let manager = create_test_manager();
        let other = JwtManager::from_secret("another-very-long-secret-key-that-does-not-match")
            .expect("Failed to create manager");
        let pair = other
            .generate_token_pair(Uuid::new_v4(), "a@example.com", vec![])
            .expect("Failed to generate");

        assert!(manager.validate_access_token(&pair.access_token).is_err());
        assert!(manager.validate_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }
}

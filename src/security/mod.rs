pub mod cors;
pub mod error_sanitizer;
pub mod jwt;
pub mod password;
pub mod validation;

pub use cors::{create_cors_layer, CorsConfig};
pub use error_sanitizer::{ApiError, ApiResult, SafeErrorResponse};
pub use jwt::{extract_bearer_token, Claims, JwtConfig, JwtManager, TokenPair, TokenType};
pub use password::{hash_password, verify_password, Argon2Config, PasswordHasher2};
pub use validation::{ValidationError, Validator};

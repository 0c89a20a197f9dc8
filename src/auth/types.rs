use serde::{Deserialize, Serialize};

use crate::core::shared::models::UserProfile;
use crate::security::jwt::TokenPair;
use crate::security::validation::{ValidationError, Validator};

pub const INVALID_CREDENTIALS: &str = "Email hoặc mật khẩu không đúng";
pub const FULL_NAME_MAX: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub target_score: Option<i32>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .email(self.email.trim())
            .password(&self.password)
            .required(&self.full_name, "full_name")
            .length(self.full_name.trim(), "full_name", None, Some(FULL_NAME_MAX))
            .target_score(self.target_score)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            email: "lan@example.com".to_string(),
            password: "matkhau123".to_string(),
            full_name: "Nguyễn Thị Lan".to_string(),
            target_score: Some(650),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_registration_rules() {
        let mut req = request();
        req.email = "not-an-email".to_string();
        assert!(matches!(req.validate(), Err(ValidationError::InvalidEmail(_))));

        let mut req = request();
        req.password = "short".to_string();
        assert!(req.validate().is_err());

        let mut req = request();
        req.full_name = "   ".to_string();
        assert!(matches!(req.validate(), Err(ValidationError::Required(_))));

        let mut req = request();
        req.target_score = Some(995);
        assert!(matches!(req.validate(), Err(ValidationError::InvalidRange { .. })));
    }

    #[test]
    fn test_surrounding_whitespace_in_email_is_accepted() {
        let mut req = request();
        req.email = "  Lan@Example.com ".to_string();
        assert!(req.validate().is_ok());
    }
}

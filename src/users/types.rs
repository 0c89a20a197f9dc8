use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;

use crate::auth::types::FULL_NAME_MAX;
use crate::core::shared::models::enums::LEVELS;
use crate::core::shared::schema::users;
use crate::security::validation::{ValidationError, Validator};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub target_score: Option<i32>,
    pub current_level: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        if let Some(name) = &self.full_name {
            validator = validator
                .required(name, "full_name")
                .length(name.trim(), "full_name", None, Some(FULL_NAME_MAX));
        }
        validator
            .target_score(self.target_score)
            .one_of(self.current_level.as_deref(), "current_level", &LEVELS)
            .optional_url(self.avatar_url.as_deref())
            .optional_phone(self.phone.as_deref())
            .finish()
    }

    pub fn into_changes(self) -> ProfileChanges {
        ProfileChanges {
            full_name: self.full_name.map(|n| n.trim().to_string()),
            target_score: self.target_score,
            current_level: self.current_level,
            avatar_url: self.avatar_url,
            phone: self.phone,
            updated_at: Utc::now(),
        }
    }
}

/// Absent fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub target_score: Option<i32>,
    pub current_level: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .required(&self.old_password, "old_password")
            .password(&self.new_password)
            .check(
                self.old_password != self.new_password,
                "new_password",
                "must differ from the current password",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_is_valid() {
        assert!(UpdateProfileRequest::default().validate().is_ok());
    }

    #[test]
    fn test_update_rules() {
        let req = UpdateProfileRequest {
            current_level: Some("expert".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateProfileRequest {
            full_name: Some("".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateProfileRequest {
            full_name: Some(" Trần Minh ".to_string()),
            target_score: Some(785),
            current_level: Some("intermediate".to_string()),
            avatar_url: Some("https://cdn.example.com/a.png".to_string()),
            phone: Some("0912345678".to_string()),
        };
        assert!(req.validate().is_ok());
        assert_eq!(req.into_changes().full_name.as_deref(), Some("Trần Minh"));
    }

    #[test]
    fn test_change_password_rules() {
        let req = ChangePasswordRequest {
            old_password: "matkhau123".to_string(),
            new_password: "matkhau123".to_string(),
        };
        assert!(req.validate().is_err());

        let req = ChangePasswordRequest {
            old_password: "matkhau123".to_string(),
            new_password: "matkhau456".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}

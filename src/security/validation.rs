use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required(String),
    TooShort { field: String, min: usize, actual: usize },
    TooLong { field: String, max: usize, actual: usize },
    InvalidRange { field: String, min: String, max: String },
    InvalidValue { field: String, message: String },
    InvalidEmail(String),
    InvalidUrl(String),
    InvalidPhone(String),
    Multiple(Vec<ValidationError>),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(field) => write!(f, "Field '{}' is required", field),
            Self::TooShort { field, min, actual } => {
                write!(f, "Field '{}' is too short: {} < {} chars", field, actual, min)
            }
            Self::TooLong { field, max, actual } => {
                write!(f, "Field '{}' is too long: {} > {} chars", field, actual, max)
            }
            Self::InvalidRange { field, min, max } => {
                write!(f, "Field '{}' must be between {} and {}", field, min, max)
            }
            Self::InvalidValue { field, message } => {
                write!(f, "Field '{}' has invalid value: {}", field, message)
            }
            Self::InvalidEmail(email) => write!(f, "Invalid email address: {}", email),
            Self::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            Self::InvalidPhone(phone) => write!(f, "Invalid phone number: {}", phone),
            Self::Multiple(errors) => {
                let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "{}", messages.join("; "))
            }
        }
    }
}

impl std::error::Error for ValidationError {}

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
    ).expect("Invalid email regex")
});

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://[a-zA-Z0-9][-a-zA-Z0-9]*(\.[a-zA-Z0-9][-a-zA-Z0-9]*)*(:\d+)?(/[-a-zA-Z0-9()@:%_\+.~#?&/=]*)?$"
    ).expect("Invalid URL regex")
});

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9]\d{8,14}$").expect("Invalid phone regex")
});

pub const MIN_TOEIC_SCORE: i32 = 10;
pub const MAX_TOEIC_SCORE: i32 = 990;

/// Trimmed, lower-cased form used for storage and duplicate checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_string_required(value: &str, field_name: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field_name.to_string()))
    } else {
        Ok(())
    }
}

pub fn validate_length(
    value: &str,
    field_name: &str,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<(), ValidationError> {
    let len = value.chars().count();

    if let Some(min_len) = min {
        if len < min_len {
            return Err(ValidationError::TooShort {
                field: field_name.to_string(),
                min: min_len,
                actual: len,
            });
        }
    }

    if let Some(max_len) = max {
        if len > max_len {
            return Err(ValidationError::TooLong {
                field: field_name.to_string(),
                max: max_len,
                actual: len,
            });
        }
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > 254 || !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.len() > 2048 || !URL_REGEX.is_match(url) {
        return Err(ValidationError::InvalidUrl(url.to_string()));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if PHONE_REGEX.is_match(&digits) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone(phone.to_string()))
    }
}

pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    value: T,
    field_name: &str,
    min: T,
    max: T,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::InvalidRange {
            field: field_name.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

pub fn validate_one_of(value: &str, field_name: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field_name.to_string(),
            message: format!("must be one of {:?}", allowed),
        })
    }
}

/// At least 8 characters with both letters and digits.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    validate_length(password, "password", Some(8), Some(128))?;

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_letter || !has_digit {
        return Err(ValidationError::InvalidValue {
            field: "password".to_string(),
            message: "must contain both letters and digits".to_string(),
        });
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, outcome: Result<(), ValidationError>) -> Self {
        if let Err(e) = outcome {
            self.errors.push(e);
        }
        self
    }

    pub fn required(self, value: &str, field_name: &str) -> Self {
        self.push(validate_string_required(value, field_name))
    }

    pub fn length(self, value: &str, field_name: &str, min: Option<usize>, max: Option<usize>) -> Self {
        self.push(validate_length(value, field_name, min, max))
    }

    pub fn email(self, value: &str) -> Self {
        self.push(validate_email(value))
    }

    pub fn password(self, value: &str) -> Self {
        self.push(validate_password(value))
    }

    pub fn optional_url(self, value: Option<&str>) -> Self {
        match value {
            Some(url) if !url.is_empty() => self.push(validate_url(url)),
            _ => self,
        }
    }

    pub fn optional_phone(self, value: Option<&str>) -> Self {
        match value {
            Some(phone) if !phone.is_empty() => self.push(validate_phone(phone)),
            _ => self,
        }
    }

    pub fn target_score(self, value: Option<i32>) -> Self {
        match value {
            Some(score) => self.push(validate_range(
                score,
                "target_score",
                MIN_TOEIC_SCORE,
                MAX_TOEIC_SCORE,
            )),
            None => self,
        }
    }

    pub fn one_of(self, value: Option<&str>, field_name: &str, allowed: &[&str]) -> Self {
        match value {
            Some(v) => self.push(validate_one_of(v, field_name, allowed)),
            None => self,
        }
    }

    pub fn check(self, condition: bool, field_name: &str, message: &str) -> Self {
        if condition {
            self
        } else {
            self.push(Err(ValidationError::InvalidValue {
                field: field_name.to_string(),
                message: message.to_string(),
            }))
        }
    }

    pub fn finish(mut self) -> Result<(), ValidationError> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ValidationError::Multiple(self.errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("hoc.vien@example.com").is_ok());
        assert!(validate_email("a+b@mail.example.vn").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("user@localhost").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  An.Nguyen@Example.COM "), "an.nguyen@example.com");
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("matkhau123").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("1234567890").is_err());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        assert!(validate_length("Nguyễn Văn A", "full_name", Some(1), Some(12)).is_ok());
        assert!(validate_length("Nguyễn Văn An", "full_name", Some(1), Some(12)).is_err());
    }

    #[test]
    fn test_url_and_phone() {
        assert!(validate_url("https://cdn.example.com/audio/part2.mp3").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_phone("0912 345 678").is_ok());
        assert!(validate_phone("+84912345678").is_ok());
        assert!(validate_phone("12").is_err());
    }

    #[test]
    fn test_validator_collects_errors() {
        let result = Validator::new()
            .required("", "full_name")
            .email("bad")
            .target_score(Some(1000))
            .finish();

        match result {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected multiple errors, got {:?}", other),
        }
    }

    #[test]
    fn test_validator_single_error_is_unwrapped() {
        let result = Validator::new()
            .required("Lan", "full_name")
            .target_score(Some(5))
            .finish();
        assert!(matches!(result, Err(ValidationError::InvalidRange { .. })));
    }

    #[test]
    fn test_validator_ok() {
        assert!(Validator::new()
            .required("Lan", "full_name")
            .email("lan@example.com")
            .password("abc12345")
            .target_score(Some(650))
            .one_of(Some("beginner"), "level", &["beginner", "intermediate", "advanced"])
            .optional_url(None)
            .finish()
            .is_ok());
    }
}

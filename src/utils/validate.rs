use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

// 学号：字母数字开头，允许 - / _
static ROLL_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9/_-]*$").expect("Invalid roll number regex"));

const WEAK_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "12345678",
    "123456789",
    "qwerty123",
    "admin123",
    "teacher123",
    "school123",
    "abcd1234",
];

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 5 || username.len() > 16 {
        return Err("Username length must be between 5 and 16 characters");
    }
    if !USERNAME_RE.is_match(username) {
        return Err("Username must contain only letters, numbers, dots, underscores or hyphens");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 至少 8 个字符，包含大写字母、小写字母和数字，且不在常见弱密码列表中。
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }
    if WEAK_PASSWORDS
        .iter()
        .any(|weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

/// 姓名、年级名等展示字段：去除首尾空白后 1..=max 个字符
pub fn validate_display_text(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(format!("{field} must not be empty"));
    }
    if len > max {
        return Err(format!("{field} must be at most {max} characters"));
    }
    Ok(())
}

pub fn validate_roll_number(roll_number: &str) -> Result<(), &'static str> {
    let roll_number = roll_number.trim();
    if roll_number.is_empty() || roll_number.len() > 32 {
        return Err("Roll number length must be between 1 and 32 characters");
    }
    if !ROLL_NUMBER_RE.is_match(roll_number) {
        return Err("Roll number may contain only letters, numbers, '/', '_' or '-'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("ms.rao_01").is_ok());
        assert!(validate_username("abc").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("teacher@school.edu").is_ok());
        assert!(validate_email("teacher@school").is_err());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password("SecurePass123").is_valid);
        assert!(validate_password("MyP@ssw0rd").is_valid);
    }

    #[test]
    fn test_password_collects_all_errors() {
        let result = validate_password("abc");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must be at least 8 characters long")
        );
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one uppercase letter")
        );
        assert!(
            result
                .errors
                .contains(&"Password must contain at least one digit")
        );
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("Teacher123");
        assert!(!result.is_valid);
        assert_eq!(
            result.error_message(),
            "Password is too common, please choose a stronger password"
        );
    }

    #[test]
    fn test_display_text() {
        assert!(validate_display_text("Grade 5", "Grade name", 64).is_ok());
        assert!(validate_display_text("   ", "Grade name", 64).is_err());
        assert!(validate_display_text(&"x".repeat(65), "Grade name", 64).is_err());
    }

    #[test]
    fn test_roll_number() {
        assert!(validate_roll_number("G5-001").is_ok());
        assert!(validate_roll_number("2025/12").is_ok());
        assert!(validate_roll_number("").is_err());
        assert!(validate_roll_number("-leading").is_err());
        assert!(validate_roll_number("a b").is_err());
    }
}

use crate::config::{AppConfig, Argon2Config};
use crate::errors::AttendanceError;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

fn build_argon2(config: &Argon2Config) -> Result<Argon2<'static>, AttendanceError> {
    let params = Params::new(
        config.memory_cost,
        config.time_cost,
        config.parallelism,
        None,
    )
    .map_err(|e| AttendanceError::validation(format!("Argon2 参数错误: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// 使用配置中的 Argon2id 参数哈希密码
pub fn hash_password(password: &str) -> Result<String, AttendanceError> {
    hash_password_with(password, &AppConfig::get().argon2)
}

pub fn hash_password_with(
    password: &str,
    config: &Argon2Config,
) -> Result<String, AttendanceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = build_argon2(config)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AttendanceError::validation(format!("密码哈希失败: {e}")))?;
    Ok(hash.to_string())
}

/// 验证密码，哈希中自带参数，无需读取配置
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_params() -> Argon2Config {
        Argon2Config {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password_with("Attendance2025", &light_params()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Attendance2025", &hash));
        assert!(!verify_password("attendance2025", &hash));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("whatever", "not-a-hash"));
        assert!(!verify_password("admin", "21232f297a57a5a743894a0e4a801fc3"));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = Argon2Config {
            memory_cost: 1,
            time_cost: 0,
            parallelism: 1,
        };
        assert!(hash_password_with("Attendance2025", &params).is_err());
    }
}

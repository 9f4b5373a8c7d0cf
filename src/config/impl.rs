use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 开发环境默认密钥，生产环境必须替换
const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// 直接读取的环境变量 → 配置键
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("APP_ENV", "app.environment"),
    ("RUST_LOG", "app.log_level"),
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("UNIX_SOCKET", "server.unix_socket_path"),
    ("CPU_COUNT", "server.workers"),
    ("JWT_SECRET", "jwt.secret"),
    ("DATABASE_URL", "database.url"),
    ("REDIS_URL", "cache.redis.url"),
    ("REDIS_KEY_PREFIX", "cache.redis.key_prefix"),
    ("CACHE_TTL", "cache.default_ttl"),
];

fn app_env() -> String {
    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
}

impl AppConfig {
    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name(&format!("config.{}", app_env())).required(false))
            .add_source(
                Environment::with_prefix("ATTENDANCE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in ENV_OVERRIDES {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        let mut app_config: AppConfig = builder.build()?.try_deserialize()?;

        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers.max(1));
        }

        app_config.validate()?;
        Ok(app_config)
    }

    /// 校验取值范围，失败时拒绝启动
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, reason: &str| {
            ConfigError::Message(format!("Invalid config `{key}`: {reason}"))
        };

        if self.jwt.secret.is_empty() {
            return Err(invalid("jwt.secret", "must not be empty"));
        }
        if self.is_production() && self.jwt.secret == DEFAULT_JWT_SECRET {
            return Err(invalid("jwt.secret", "default secret is not allowed in production"));
        }
        if self.jwt.access_token_expiry <= 0
            || self.jwt.refresh_token_expiry <= 0
            || self.jwt.refresh_token_remember_me_expiry <= 0
        {
            return Err(invalid("jwt", "token expiry must be positive"));
        }
        if !(1..=900).contains(&self.rate_limit.window_secs) {
            return Err(invalid("rate_limit.window_secs", "expected 1..=900 seconds"));
        }
        if !matches!(
            self.report.paper.to_ascii_lowercase().as_str(),
            "a4" | "letter"
        ) {
            return Err(invalid("report.paper", "expected `a4` or `letter`"));
        }
        if self.report.margin_mm <= 0.0 || self.report.font_size <= 0.0 {
            return Err(invalid("report", "margin and font size must be positive"));
        }
        if self.report.file_name.trim().is_empty() {
            return Err(invalid("report.file_name", "must not be empty"));
        }
        Ok(())
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 在应用启动时调用，重复初始化返回错误
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 配置了 Unix 套接字时优先于 TCP
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        Some(self.server.unix_socket_path.as_str()).filter(|path| !path.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::get();
        assert!(config.validate().is_ok());
        assert!(config.server.workers >= 1);
        assert_eq!(config.report.paper, "a4");
        assert_eq!(config.rate_limit.login, 5);
    }

    #[test]
    fn test_reports_default_to_landscape_a4() {
        let fallback = super::super::ReportConfig::default();
        assert!(fallback.landscape);
        assert_eq!(fallback.paper, "a4");
        assert!(AppConfig::get().report.landscape);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::get().clone();
        config.report.paper = "a3".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::get().clone();
        config.jwt.access_token_expiry = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::get().clone();
        config.app.environment = "production".to_string();
        config.jwt.secret = DEFAULT_JWT_SECRET.to_string();
        assert!(config.validate().is_err());
        config.jwt.secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_have_unique_vars() {
        let mut vars: Vec<&str> = ENV_OVERRIDES.iter().map(|(var, _)| *var).collect();
        vars.sort_unstable();
        vars.dedup();
        assert_eq!(vars.len(), ENV_OVERRIDES.len());
    }
}

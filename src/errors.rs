//! 统一错误处理模块
//!
//! 每个变体携带错误代码、类型名称以及映射到 HTTP 时的状态码，
//! 构造函数由宏按变体名的 snake_case 生成（如 `AttendanceError::conflict`）。

use actix_web::http::StatusCode;
use std::fmt;

macro_rules! define_attendance_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $status:ident)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum AttendanceError {
            $($variant(String),)*
        }

        impl AttendanceError {
            pub fn code(&self) -> &'static str {
                match self {
                    $(AttendanceError::$variant(_) => $code,)*
                }
            }

            pub fn error_type(&self) -> &'static str {
                match self {
                    $(AttendanceError::$variant(_) => $type_name,)*
                }
            }

            pub fn message(&self) -> &str {
                match self {
                    $(AttendanceError::$variant(msg) => msg,)*
                }
            }

            /// 作为接口响应返回时使用的状态码
            pub fn status_code(&self) -> StatusCode {
                match self {
                    $(AttendanceError::$variant(_) => StatusCode::$status,)*
                }
            }
        }

        paste::paste! {
            impl AttendanceError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        AttendanceError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_attendance_errors! {
    // 基础设施
    CacheConnection("E001", "Cache Connection Error", INTERNAL_SERVER_ERROR),
    CachePluginNotFound("E002", "Cache Plugin Not Found", INTERNAL_SERVER_ERROR),
    DatabaseConfig("E003", "Database Configuration Error", INTERNAL_SERVER_ERROR),
    DatabaseConnection("E004", "Database Connection Error", SERVICE_UNAVAILABLE),
    DatabaseOperation("E005", "Database Operation Error", INTERNAL_SERVER_ERROR),
    FileOperation("E006", "File Operation Error", INTERNAL_SERVER_ERROR),
    Serialization("E007", "Serialization Error", INTERNAL_SERVER_ERROR),
    DateParse("E008", "Date Parse Error", BAD_REQUEST),
    ReportRender("E009", "Report Render Error", INTERNAL_SERVER_ERROR),
    // 业务规则
    Validation("E010", "Validation Error", BAD_REQUEST),
    Conflict("E011", "Resource Conflict", CONFLICT),
}

impl AttendanceError {
    /// 开发环境终端输出
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否为调用方可修正的错误 (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl fmt::Display for AttendanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_simple())
    }
}

impl std::error::Error for AttendanceError {}

impl From<sea_orm::DbErr> for AttendanceError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::Conn(e) => AttendanceError::DatabaseConnection(e.to_string()),
            other => AttendanceError::DatabaseOperation(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AttendanceError {
    fn from(err: std::io::Error) -> Self {
        AttendanceError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AttendanceError {
    fn from(err: serde_json::Error) -> Self {
        AttendanceError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for AttendanceError {
    fn from(err: chrono::ParseError) -> Self {
        AttendanceError::DateParse(err.to_string())
    }
}

impl From<printpdf::Error> for AttendanceError {
    fn from(err: printpdf::Error) -> Self {
        AttendanceError::ReportRender(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_constructors() {
        let err = AttendanceError::cache_plugin_not_found("memcached");
        assert_eq!(err.code(), "E002");
        assert_eq!(err.error_type(), "Cache Plugin Not Found");
        assert_eq!(err.message(), "memcached");
        assert_eq!(err.to_string(), "Cache Plugin Not Found: memcached");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AttendanceError::conflict("sheet exists").status_code(),
            StatusCode::CONFLICT
        );
        assert!(AttendanceError::validation("bad").is_client_error());
        assert!(!AttendanceError::database_operation("boom").is_client_error());
    }

    #[test]
    fn test_db_connection_errors_are_distinguished() {
        let err: AttendanceError =
            sea_orm::DbErr::Conn(sea_orm::RuntimeErr::Internal("refused".into())).into();
        assert_eq!(err.code(), "E004");
        let err: AttendanceError = sea_orm::DbErr::RecordNotFound("x".into()).into();
        assert_eq!(err.code(), "E005");
    }

    #[test]
    fn test_date_parse_conversion() {
        let err: AttendanceError = chrono::NaiveDate::parse_from_str("2024-13-40", "%Y-%m-%d")
            .unwrap_err()
            .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}

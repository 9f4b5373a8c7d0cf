pub mod attendance;
pub mod auth;
pub mod grades;
pub mod reports;
pub mod students;
pub mod users;

pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use grades::GradeService;
pub use reports::ReportService;
pub use students::StudentService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};
use std::sync::Arc;
use tracing::error;

use crate::errors::AttendanceError;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, users::entities::User};
use crate::storage::Storage;
use crate::utils::date::validate_date_range;

/// 优先使用服务自带的存储，否则从 app_data 中获取
pub(crate) fn resolve_storage(
    own: Option<&Arc<dyn Storage>>,
    request: &HttpRequest,
) -> ActixResult<Arc<dyn Storage>> {
    if let Some(storage) = own {
        return Ok(storage.clone());
    }
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not found in app data");
            actix_web::error::ErrorInternalServerError("Storage not configured")
        })
}

/// 当前登录账号；路由未经过 RequireJWT 时返回 401 响应
pub(crate) fn current_user(request: &HttpRequest) -> Result<User, HttpResponse> {
    RequireJWT::extract_user_claims(request).ok_or_else(|| {
        error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )
    })
}

/// 教师只能访问自己负责的年级
pub(crate) fn ensure_grade_access(user: &User, grade_id: i64) -> Result<(), HttpResponse> {
    if user.can_access_grade(grade_id) {
        return Ok(());
    }
    Err(error_response(
        StatusCode::FORBIDDEN,
        ErrorCode::GradePermissionDenied,
        "You can only access your own grade",
    ))
}

pub(crate) fn ensure_date_range(
    from: chrono::NaiveDate,
    to: chrono::NaiveDate,
    code: ErrorCode,
) -> Result<(), HttpResponse> {
    validate_date_range(from, to).map_err(|msg| error_response(StatusCode::BAD_REQUEST, code, msg))
}

pub(crate) fn error_response(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse::error_empty(code, message))
}

/// 存储层错误转为响应，冲突与校验错误保留原状态码
pub(crate) fn storage_error(code: ErrorCode, context: &str, err: &AttendanceError) -> HttpResponse {
    if err.is_client_error() {
        return error_response(err.status_code(), code, err.message());
    }
    error!("{}: {}", context, err);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        code,
        format!("{context}: {}", err.message()),
    )
}

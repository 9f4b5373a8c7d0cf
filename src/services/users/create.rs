use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use tracing::info;

use super::UserService;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{entities::UserRole, requests::CreateUserRequest, responses::UserResponse},
};
use crate::services::{error_response, storage_error};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::validate::{
    validate_display_text, validate_email, validate_password_simple, validate_username,
};

/// 教师账号必须关联一个已存在的年级
pub(crate) async fn check_teacher_grade(
    storage: &dyn Storage,
    grade_id: Option<i64>,
) -> Result<(), HttpResponse> {
    let Some(grade_id) = grade_id else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::TeacherGradeRequired,
            "Teacher accounts must be assigned to a grade",
        ));
    };

    match storage.get_grade_by_id(grade_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            ErrorCode::GradeNotFound,
            format!("Grade {grade_id} not found"),
        )),
        Err(e) => Err(storage_error(
            ErrorCode::InternalServerError,
            "Failed to check grade",
            &e,
        )),
    }
}

pub async fn create_user(
    service: &UserService,
    mut user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    user_data.username = user_data.username.trim().to_string();
    user_data.email = user_data.email.trim().to_lowercase();

    if let Err(msg) = validate_username(&user_data.username) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserNameInvalid, msg)));
    }

    if let Err(msg) = validate_email(&user_data.email) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
    }

    if let Err(msg) = validate_password_simple(&user_data.password) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
    }

    if let Some(name) = user_data.display_name.as_deref()
        && let Err(msg) = validate_display_text(name, "Display name", 64)
    {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
    }

    let storage = service.get_storage(request)?;

    if user_data.role == UserRole::Teacher
        && let Err(resp) = check_teacher_grade(storage.as_ref(), user_data.grade_id).await
    {
        return Ok(resp);
    }

    match storage.get_user_by_username(&user_data.username).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::UserAlreadyExists,
                "Username already exists",
            )));
        }
        Ok(None) => {}
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::UserCreationFailed,
                "User creation failed",
                &e,
            ));
        }
    }

    match storage.get_user_by_email(&user_data.email).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::UserEmailAlreadyExists,
                "Email already exists",
            )));
        }
        Ok(None) => {}
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::UserCreationFailed,
                "User creation failed",
                &e,
            ));
        }
    }

    user_data.password = match hash_password(&user_data.password) {
        Ok(hash) => hash,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Password hashing failed: {e}"),
                )),
            );
        }
    };

    match storage.create_user(user_data).await {
        Ok(user) => {
            info!("Created {} account {}", user.role, user.username);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(UserResponse { user }, "User created successfully")))
        }
        Err(e) => Ok(storage_error(
            ErrorCode::UserCreationFailed,
            "User creation failed",
            &e,
        )),
    }
}

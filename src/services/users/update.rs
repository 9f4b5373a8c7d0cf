use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use super::create::check_teacher_grade;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{entities::UserRole, requests::UpdateUserRequest, responses::UserResponse},
};
use crate::services::{current_user, storage_error};
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_display_text, validate_email, validate_password_simple};

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    mut update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    let existing = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "User not found",
            )));
        }
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::UserUpdateFailed,
                "Failed to update user information",
                &e,
            ));
        }
    };

    // 不能修改自己的角色或状态，避免把自己锁在系统外
    let changes_own_access = update_data.role.as_ref().is_some_and(|r| *r != existing.role)
        || update_data
            .status
            .as_ref()
            .is_some_and(|s| *s != existing.status);
    if current.id == user_id && changes_own_access {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Cannot change the role or status of the current user",
        )));
    }

    if let Some(email) = update_data.email.as_mut() {
        *email = email.trim().to_lowercase();
        if let Err(msg) = validate_email(email) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
        }
        match storage.get_user_by_email(email).await {
            Ok(Some(other)) if other.id != user_id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::UserEmailAlreadyExists,
                    "Email already exists",
                )));
            }
            Ok(_) => {}
            Err(e) => {
                return Ok(storage_error(
                    ErrorCode::UserUpdateFailed,
                    "Failed to update user information",
                    &e,
                ));
            }
        }
    }

    if let Some(name) = update_data.display_name.as_deref()
        && let Err(msg) = validate_display_text(name, "Display name", 64)
    {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
    }

    let role = update_data.role.clone().unwrap_or(existing.role.clone());
    if role == UserRole::Teacher {
        let grade_id = update_data.grade_id.or(existing.grade_id);
        if let Err(resp) = check_teacher_grade(storage.as_ref(), grade_id).await {
            return Ok(resp);
        }
    }

    if let Some(password) = update_data.password.take() {
        if let Err(msg) = validate_password_simple(&password) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
        }
        match hash_password(&password) {
            Ok(hash) => update_data.password = Some(hash),
            Err(e) => {
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        format!("Password hashing failed: {e}"),
                    )),
                );
            }
        }
    }

    match storage.update_user(user_id, update_data).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user },
            "User information updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::UserUpdateFailed,
            "Failed to update user information",
            &e,
        )),
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::middlewares::require_jwt::user_cache_key;
use crate::models::auth::requests::UpdateProfileRequest;
use crate::models::users::requests::UpdateUserRequest;
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, storage_error};
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::{validate_display_text, validate_email, validate_password_simple};

use super::AuthService;

// 资料变更后丢弃该 token 对应的缓存账号
async fn evict_cached_user(request: &HttpRequest) {
    let token = request
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim);
    let cache = request.app_data::<web::Data<Arc<dyn ObjectCache>>>();
    if let (Some(token), Some(cache)) = (token, cache) {
        cache.remove(&user_cache_key(token)).await;
    }
}

pub async fn handle_update_profile(
    service: &AuthService,
    mut update_data: UpdateProfileRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    if let Some(email) = update_data.email.as_mut() {
        *email = email.trim().to_lowercase();
        if let Err(msg) = validate_email(email) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
        }
        if let Ok(Some(existing)) = storage.get_user_by_email(email).await
            && existing.id != current.id
        {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::UserEmailAlreadyExists,
                "Email already exists",
            )));
        }
    }

    if let Some(name) = update_data.display_name.as_deref()
        && let Err(msg) = validate_display_text(name, "Display name", 64)
    {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg)));
    }

    let hashed_password = match update_data.new_password.as_deref() {
        Some(new_password) => {
            // 请求扩展中的账号不含密码哈希，需重新读取
            let stored = match storage.get_user_by_id(current.id).await {
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
                        "Failed to update profile",
                        &e,
                    ));
                }
            };

            let confirmed = update_data
                .current_password
                .as_deref()
                .is_some_and(|pw| verify_password(pw, &stored.password_hash));
            if !confirmed {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::UserPasswordInvalid,
                    "Current password is incorrect",
                )));
            }

            if let Err(msg) = validate_password_simple(new_password) {
                return Ok(HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
            }

            match hash_password(new_password) {
                Ok(hash) => Some(hash),
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
        None => None,
    };

    // 角色、状态和年级只能由管理员修改
    let storage_update = UpdateUserRequest {
        email: update_data.email,
        password: hashed_password,
        role: None,
        status: None,
        display_name: update_data.display_name,
        grade_id: None,
        qualification: None,
    };

    match storage.update_user(current.id, storage_update).await {
        Ok(Some(user)) => {
            evict_cached_user(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "Profile updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::UserUpdateFailed,
            "Failed to update profile",
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::models::users::requests::CreateUserRequest;
    use crate::services::test_support::request_as;
    use crate::storage::sea_orm_storage::tests::{seed_grade, test_storage};
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn test_password_change_requires_current_password() {
        let storage = Arc::new(test_storage().await);
        let grade = seed_grade(&storage, "Grade 12").await;
        let teacher = storage
            .create_user_impl(CreateUserRequest {
                username: "teach12".to_string(),
                email: "teach12@school.test".to_string(),
                password: hash_password("Attend4nce").unwrap(),
                role: UserRole::Teacher,
                display_name: None,
                grade_id: Some(grade.id),
                qualification: None,
            })
            .await
            .unwrap();
        let service = AuthService::with_storage(storage.clone());
        let req = request_as(&teacher);

        let change = |current: &str| UpdateProfileRequest {
            display_name: Some("Ms. Khan".to_string()),
            email: None,
            current_password: Some(current.to_string()),
            new_password: Some("N3wPassword".to_string()),
        };

        let resp = service.update_profile(change("nope"), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = service.update_profile(change("Attend4nce"), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let stored = storage.get_user_by_id_impl(teacher.id).await.unwrap().unwrap();
        assert!(verify_password("N3wPassword", &stored.password_hash));
        assert_eq!(stored.display_name.as_deref(), Some("Ms. Khan"));
        assert_eq!(stored.grade_id, Some(grade.id));
    }
}

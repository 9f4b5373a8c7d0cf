use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info, warn};

use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
    users::entities::UserStatus,
};
use crate::services::storage_error;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;

use super::AuthService;

const LOGIN_FAILED: &str = "Username or password is incorrect";

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let identifier = login_request.username.trim();
    if identifier.is_empty() || login_request.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Username and password are required",
        )));
    }

    let storage = service.get_storage(request)?;
    let config = service.get_config();

    // 管理员通常用用户名登录，教师用邮箱
    let mut user = match storage.get_user_by_username_or_email(identifier).await {
        Ok(Some(user)) if verify_password(&login_request.password, &user.password_hash) => user,
        Ok(_) => {
            info!("Failed login attempt for '{}'", identifier);
            return Ok(HttpResponse::Unauthorized()
                .json(ApiResponse::error_empty(ErrorCode::AuthFailed, LOGIN_FAILED)));
        }
        Err(e) => return Ok(storage_error(ErrorCode::InternalServerError, "Login failed", &e)),
    };

    if user.status != UserStatus::Active {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::AccountDisabled,
            format!("Account is {}", user.status),
        )));
    }

    match storage.update_last_login(user.id).await {
        Ok(_) => user.last_login = Some(chrono::Utc::now()),
        Err(e) => warn!("Failed to update last login for {}: {}", user.id, e),
    }

    let refresh_expiry = JwtUtils::refresh_token_expiry(login_request.remember_me);
    let token_pair = match user.generate_token_pair(Some(refresh_expiry)) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Failed to generate JWT token: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Login failed, unable to generate token",
                )),
            );
        }
    };

    info!(
        "User {} ({}) logged in to {}",
        user.username, user.role, config.app.system_name
    );

    let refresh_cookie =
        JwtUtils::create_refresh_token_cookie(&token_pair.refresh_token, refresh_expiry);
    let response = LoginResponse {
        access_token: token_pair.access_token,
        expires_in: JwtUtils::access_token_ttl_seconds(),
        user,
        created_at: chrono::Utc::now(),
    };

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie)
        .json(ApiResponse::success(response, "Login successful")))
}

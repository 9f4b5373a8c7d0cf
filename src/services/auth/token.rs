use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use crate::models::auth::responses::{
    RefreshTokenResponse, TokenVerificationResponse, UserInfoResponse,
};
use crate::models::users::entities::UserStatus;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::utils::jwt::JwtUtils;

use super::AuthService;

fn session_expired() -> HttpResponse {
    // 同时清除客户端上无效的 refresh token
    HttpResponse::Unauthorized()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Login expired or invalid, please login again",
        ))
}

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };

    let claims = match JwtUtils::verify_refresh_token(&refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            info!("Refresh token rejected: {}", e);
            return Ok(session_expired());
        }
    };
    let Some(user_id) = claims.user_id() else {
        return Ok(session_expired());
    };

    // 角色取数据库中的当前值，账号被停用后不再续期
    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.status == UserStatus::Active => user,
        Ok(_) => return Ok(session_expired()),
        Err(e) => {
            error!("Failed to load user {} for refresh: {}", user_id, e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Token refresh failed",
                )),
            );
        }
    };

    match JwtUtils::generate_access_token(user.id, &user.role.to_string()) {
        Ok(access_token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: JwtUtils::access_token_ttl_seconds(),
            },
            "Token refreshed successfully",
        ))),
        Err(e) => {
            error!("Refresh token failed: {}", e);
            Ok(session_expired())
        }
    }
}

pub async fn handle_verify_token(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let is_valid = current_user(request).is_ok();
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        TokenVerificationResponse { is_valid },
        if is_valid {
            "Token is valid"
        } else {
            "Token is invalid"
        },
    )))
}

pub async fn handle_get_user(request: &HttpRequest) -> ActixResult<HttpResponse> {
    match current_user(request) {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserInfoResponse { user },
            "User information retrieved successfully",
        ))),
        Err(resp) => Ok(resp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::body_json;
    use crate::storage::sea_orm_storage::tests::{seed_grade, seed_teacher, test_storage};
    use crate::utils::jwt::REFRESH_TOKEN_COOKIE;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_refresh_uses_current_role() {
        let storage = Arc::new(test_storage().await);
        let grade = seed_grade(&storage, "Grade 11").await;
        let teacher = seed_teacher(&storage, "teach11", grade.id).await;
        let service = AuthService::with_storage(storage.clone());

        // 旧 token 中记录的角色与数据库不一致
        let pair = JwtUtils::generate_token_pair(teacher.id, "admin", None).unwrap();
        let req = TestRequest::default()
            .cookie(Cookie::new(REFRESH_TOKEN_COOKIE, pair.refresh_token))
            .to_http_request();

        let resp = service.refresh_token(&req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let access = body["data"]["access_token"].as_str().unwrap();
        let claims = JwtUtils::verify_access_token(access).unwrap();
        assert_eq!(claims.role, UserRole::Teacher.to_string());
    }

    #[actix_web::test]
    async fn test_refresh_rejects_access_token_and_unknown_user() {
        let storage = Arc::new(test_storage().await);
        let service = AuthService::with_storage(storage.clone());

        let pair = JwtUtils::generate_token_pair(42, "teacher", None).unwrap();
        let req = TestRequest::default()
            .cookie(Cookie::new(REFRESH_TOKEN_COOKIE, pair.access_token))
            .to_http_request();
        let resp = service.refresh_token(&req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::default()
            .cookie(Cookie::new(REFRESH_TOKEN_COOKIE, pair.refresh_token))
            .to_http_request();
        let resp = service.refresh_token(&req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::default().to_http_request();
        let resp = service.refresh_token(&req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}

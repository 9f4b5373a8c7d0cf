use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UserService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, storage_error};

// 初始管理员账号
const BOOTSTRAP_ADMIN_ID: i64 = 1;

pub async fn delete_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    if user_id == current.id || user_id == BOOTSTRAP_ADMIN_ID {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::CanNotDeleteCurrentUser,
            "Cannot delete the current user or the initial administrator",
        )));
    }

    let storage = service.get_storage(request)?;

    match storage.delete_user(user_id).await {
        Ok(true) => {
            info!("User {} deleted by {}", user_id, current.username);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::UserDeleteFailed,
            "User deletion failed",
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::{request_as, staff};
    use crate::storage::sea_orm_storage::tests::{seed_grade, seed_teacher, test_storage};
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_delete_guards_and_not_found() {
        let storage = Arc::new(test_storage().await);
        let grade = seed_grade(&storage, "Grade 8").await;
        let first = seed_teacher(&storage, "teach00", grade.id).await;
        assert_eq!(first.id, BOOTSTRAP_ADMIN_ID);
        let teacher = seed_teacher(&storage, "teach08", grade.id).await;
        let service = UserService::with_storage(storage.clone());
        let req = request_as(&staff(50, UserRole::Admin, None));

        let resp = service.delete_user(50, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = service.delete_user(BOOTSTRAP_ADMIN_ID, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = service.delete_user(teacher.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = service.delete_user(teacher.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::GradeService;
use crate::models::users::requests::UserListQuery;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error;

pub async fn delete_grade(
    service: &GradeService,
    grade_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.count_students_in_grade(grade_id).await {
        Ok(0) => {}
        Ok(count) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::GradeNotEmpty,
                format!("Grade still has {count} students"),
            )));
        }
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::InternalServerError,
                "Failed to delete grade",
                &e,
            ));
        }
    }

    // 教师账号必须关联年级，先解除分配
    let teachers = UserListQuery {
        size: Some(1),
        grade_id: Some(grade_id),
        ..Default::default()
    };
    match storage.list_users_with_pagination(teachers).await {
        Ok(list) if list.pagination.total > 0 => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::GradeNotEmpty,
                "Grade still has teachers assigned",
            )));
        }
        Ok(_) => {}
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::InternalServerError,
                "Failed to delete grade",
                &e,
            ));
        }
    }

    match storage.delete_grade(grade_id).await {
        Ok(true) => {
            info!("Grade {} deleted", grade_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Grade deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::GradeNotFound,
            "Grade not found",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to delete grade",
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::{request_as, staff};
    use crate::storage::sea_orm_storage::tests::{
        seed_grade, seed_student, seed_teacher, test_storage,
    };
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_delete_grade_guards() {
        let storage = Arc::new(test_storage().await);
        let with_students = seed_grade(&storage, "Grade 9").await;
        seed_student(&storage, "Chen", "G9-001", with_students.id).await;
        let with_teacher = seed_grade(&storage, "Grade 10").await;
        seed_teacher(&storage, "teach10", with_teacher.id).await;
        let empty = seed_grade(&storage, "Grade 11").await;

        let service = GradeService::with_storage(storage.clone());
        let req = request_as(&staff(1, UserRole::Admin, None));

        let resp = service.delete_grade(with_students.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let resp = service.delete_grade(with_teacher.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = service.delete_grade(empty.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = service.delete_grade(empty.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

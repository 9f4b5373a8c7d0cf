use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::GradeService;
use crate::models::grades::responses::GradeResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, ensure_grade_access, storage_error};

pub async fn get_grade(
    service: &GradeService,
    grade_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = ensure_grade_access(&current, grade_id) {
        return Ok(resp);
    }

    let storage = service.get_storage(request)?;

    let grade = match storage.get_grade_by_id(grade_id).await {
        Ok(Some(grade)) => grade,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::GradeNotFound,
                "Grade not found",
            )));
        }
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::InternalServerError,
                "Failed to get grade",
                &e,
            ));
        }
    };

    match storage.count_students_in_grade(grade_id).await {
        Ok(count) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            GradeResponse {
                grade,
                student_count: count as i64,
            },
            "Grade retrieved successfully",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to count students",
            &e,
        )),
    }
}

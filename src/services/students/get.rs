use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::models::students::entities::Student;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, ensure_grade_access, storage_error};
use crate::storage::Storage;

/// 读取学生并检查当前账号能否访问其年级
pub(crate) async fn load_accessible_student(
    storage: &dyn Storage,
    user: &User,
    student_id: i64,
) -> Result<Student, HttpResponse> {
    let student = match storage.get_student_by_id(student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => {
            return Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "Student not found",
            )));
        }
        Err(e) => {
            return Err(storage_error(
                ErrorCode::InternalServerError,
                "Failed to get student",
                &e,
            ));
        }
    };
    ensure_grade_access(user, student.grade_id)?;
    Ok(student)
}

pub async fn get_student(
    service: &StudentService,
    student_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match load_accessible_student(storage.as_ref(), &current, student_id).await {
        Ok(student) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            student,
            "Student retrieved successfully",
        ))),
        Err(resp) => Ok(resp),
    }
}

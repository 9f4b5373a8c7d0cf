use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use tracing::info;

use super::StudentService;
use crate::models::students::requests::CreateStudentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{error_response, storage_error};
use crate::storage::Storage;
use crate::utils::date::is_future_date;
use crate::utils::validate::{validate_display_text, validate_roll_number};

pub(crate) const STUDENT_NAME_MAX: usize = 100;

/// 校验学生字段，`None` 表示不修改
pub(crate) fn validate_student_fields(
    name: Option<&str>,
    roll_number: Option<&str>,
    date_of_birth: Option<chrono::NaiveDate>,
) -> Result<(), HttpResponse> {
    let invalid = |msg: String| {
        error_response(StatusCode::BAD_REQUEST, ErrorCode::StudentDataInvalid, msg)
    };

    if let Some(name) = name {
        validate_display_text(name, "Student name", STUDENT_NAME_MAX).map_err(invalid)?;
    }
    if let Some(roll_number) = roll_number {
        validate_roll_number(roll_number).map_err(|msg| invalid(msg.to_string()))?;
    }
    if date_of_birth.is_some_and(is_future_date) {
        return Err(invalid("Date of birth cannot be in the future".to_string()));
    }
    Ok(())
}

pub(crate) async fn ensure_grade_exists(
    storage: &dyn Storage,
    grade_id: i64,
) -> Result<(), HttpResponse> {
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

/// 学号必须唯一，`exclude` 为正在修改的学生
pub(crate) async fn ensure_roll_number_free(
    storage: &dyn Storage,
    roll_number: &str,
    exclude: Option<i64>,
) -> Result<(), HttpResponse> {
    match storage.get_student_by_roll_number(roll_number.trim()).await {
        Ok(Some(existing)) if Some(existing.id) != exclude => Err(error_response(
            StatusCode::CONFLICT,
            ErrorCode::StudentAlreadyExists,
            format!("Roll number '{}' is already in use", roll_number.trim()),
        )),
        Ok(_) => Ok(()),
        Err(e) => Err(storage_error(
            ErrorCode::InternalServerError,
            "Failed to check roll number",
            &e,
        )),
    }
}

pub async fn create_student(
    service: &StudentService,
    student_data: CreateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(resp) = validate_student_fields(
        Some(&student_data.name),
        Some(&student_data.roll_number),
        student_data.date_of_birth,
    ) {
        return Ok(resp);
    }

    let storage = service.get_storage(request)?;

    if let Err(resp) = ensure_grade_exists(storage.as_ref(), student_data.grade_id).await {
        return Ok(resp);
    }
    if let Err(resp) =
        ensure_roll_number_free(storage.as_ref(), &student_data.roll_number, None).await
    {
        return Ok(resp);
    }

    match storage.create_student(student_data).await {
        Ok(student) => {
            info!(
                "Student {} ({}) added to grade {}",
                student.name, student.roll_number, student.grade_id
            );
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(student, "Student created successfully")))
        }
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to create student",
            &e,
        )),
    }
}

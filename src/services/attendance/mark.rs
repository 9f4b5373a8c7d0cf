use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use tracing::info;

use super::{AttendanceService, resolve_grade};
use crate::errors::AttendanceError;
use crate::models::attendance::requests::MarkAttendanceRequest;
use crate::models::attendance::responses::MarkAttendanceResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, error_response, storage_error};
use crate::utils::date::is_future_date;

pub async fn mark_attendance(
    service: &AttendanceService,
    sheet: MarkAttendanceRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let grade_id = match resolve_grade(&current, sheet.grade_id) {
        Ok(grade_id) => grade_id,
        Err(resp) => return Ok(resp),
    };
    if is_future_date(sheet.date) {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::AttendanceDateInvalid,
            "Attendance cannot be marked for a future date",
        ));
    }

    let storage = service.get_storage(request)?;

    match storage.get_grade_by_id(grade_id).await {
        Ok(Some(_)) => {}
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
    }

    match storage
        .mark_attendance(grade_id, sheet.date, current.id, sheet.records)
        .await
    {
        Ok(items) => {
            info!(
                "{} marked attendance for grade {} on {} ({} students)",
                current.username,
                grade_id,
                sheet.date,
                items.len()
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                MarkAttendanceResponse {
                    grade_id,
                    date: sheet.date,
                    items,
                },
                "Attendance marked successfully",
            )))
        }
        Err(AttendanceError::Validation(msg)) => Ok(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::AttendanceRecordsInvalid,
            msg,
        )),
        Err(AttendanceError::Conflict(_)) => Ok(error_response(
            StatusCode::CONFLICT,
            ErrorCode::AttendanceAlreadyExists,
            format!("Attendance for this grade on {} is already recorded", sheet.date),
        )),
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to mark attendance",
            &e,
        )),
    }
}

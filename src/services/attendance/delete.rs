use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AttendanceService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error;

pub async fn delete_attendance(
    service: &AttendanceService,
    attendance_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.delete_attendance(attendance_id).await {
        Ok(true) => {
            info!("Attendance record {} deleted", attendance_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Attendance record deleted successfully",
            )))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::AttendanceNotFound,
            "Attendance record not found",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to delete attendance record",
            &e,
        )),
    }
}

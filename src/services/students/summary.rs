use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use super::get::load_accessible_student;
use crate::models::attendance::entities::AttendanceTally;
use crate::models::attendance::requests::AttendanceRangeParams;
use crate::models::attendance::responses::{
    StudentAttendanceSummary, StudentAttendanceSummaryResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, ensure_date_range, storage_error};

pub async fn student_attendance_summary(
    service: &StudentService,
    student_id: i64,
    range: AttendanceRangeParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = ensure_date_range(range.from_date, range.to_date, ErrorCode::BadRequest) {
        return Ok(resp);
    }

    let storage = service.get_storage(request)?;
    let student = match load_accessible_student(storage.as_ref(), &current, student_id).await {
        Ok(student) => student,
        Err(resp) => return Ok(resp),
    };

    let records = match storage
        .list_student_attendance_between(student.id, range.from_date, range.to_date)
        .await
    {
        Ok(records) => records,
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::InternalServerError,
                "Failed to load attendance",
                &e,
            ));
        }
    };

    let tally = AttendanceTally::from_statuses(records.iter().map(|r| &r.status));
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StudentAttendanceSummaryResponse {
            from_date: range.from_date,
            to_date: range.to_date,
            summary: StudentAttendanceSummary::new(
                student.id,
                student.name,
                student.roll_number,
                tally,
            ),
        },
        "Attendance summary retrieved successfully",
    )))
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AttendanceService;
use crate::models::attendance::requests::{AttendanceListParams, AttendanceListQuery};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, ensure_date_range, ensure_grade_access, storage_error};

pub async fn list_attendance(
    service: &AttendanceService,
    query: AttendanceListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let mut list_query = AttendanceListQuery::from(query);
    if let (Some(from), Some(to)) = (list_query.from_date, list_query.to_date)
        && let Err(resp) = ensure_date_range(from, to, ErrorCode::BadRequest)
    {
        return Ok(resp);
    }

    // 教师只能看到自己年级的记录
    if current.role == UserRole::Teacher {
        match list_query.grade_id {
            Some(grade_id) => {
                if let Err(resp) = ensure_grade_access(&current, grade_id) {
                    return Ok(resp);
                }
            }
            None => list_query.grade_id = Some(current.grade_id.unwrap_or(0)),
        }
    }

    let storage = service.get_storage(request)?;

    match storage.list_attendance_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Attendance list retrieved successfully",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to retrieve attendance list",
            &e,
        )),
    }
}

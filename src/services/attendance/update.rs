use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AttendanceService;
use crate::models::attendance::requests::UpdateAttendanceRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, ensure_grade_access, storage_error};

/// 只允许修改出勤状态
pub async fn update_attendance(
    service: &AttendanceService,
    attendance_id: i64,
    update_data: UpdateAttendanceRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let storage = service.get_storage(request)?;

    let detail = match storage.get_attendance_by_id(attendance_id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::AttendanceNotFound,
                "Attendance record not found",
            )));
        }
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::InternalServerError,
                "Failed to get attendance record",
                &e,
            ));
        }
    };
    if let Err(resp) = ensure_grade_access(&current, detail.grade_id) {
        return Ok(resp);
    }

    match storage
        .update_attendance_status(attendance_id, update_data.status)
        .await
    {
        Ok(Some(record)) => {
            info!(
                "{} changed attendance {} of student {} to {}",
                current.username, attendance_id, record.student_id, record.status
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                record,
                "Attendance updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::AttendanceNotFound,
            "Attendance record not found",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to update attendance",
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::entities::AttendanceStatus;
    use crate::models::attendance::requests::AttendanceEntry;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::{body_json, request_as, staff};
    use crate::storage::sea_orm_storage::tests::{
        seed_grade, seed_student, seed_teacher, test_storage,
    };
    use actix_web::http::StatusCode;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_update_status_checks_grade() {
        let storage = Arc::new(test_storage().await);
        let grade = seed_grade(&storage, "Grade 9").await;
        let teacher = seed_teacher(&storage, "teach09", grade.id).await;
        let student = seed_student(&storage, "Tara", "G9-001", grade.id).await;
        let records = storage
            .mark_attendance_impl(
                grade.id,
                NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
                teacher.id,
                vec![AttendanceEntry {
                    student_id: student.id,
                    status: AttendanceStatus::Absent,
                }],
            )
            .await
            .unwrap();
        let service = AttendanceService::with_storage(storage.clone());
        let change = || UpdateAttendanceRequest {
            status: AttendanceStatus::Present,
        };

        let outsider = request_as(&staff(7, UserRole::Teacher, Some(grade.id + 1)));
        let resp = service
            .update_attendance(records[0].id, change(), &outsider)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = service
            .update_attendance(records[0].id, change(), &request_as(&teacher))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["data"]["status"], "present");

        let resp = service
            .update_attendance(9999, change(), &request_as(&teacher))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

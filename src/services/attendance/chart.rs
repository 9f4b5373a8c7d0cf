use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AttendanceService, resolve_grade};
use crate::models::attendance::entities::{AttendanceDetail, AttendanceTally};
use crate::models::attendance::requests::AttendanceChartParams;
use crate::models::attendance::responses::{AttendanceChartItem, AttendanceChartResponse};
use crate::models::grades::entities::Grade;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, storage_error};

pub(crate) fn build_chart(
    grade: Grade,
    date: chrono::NaiveDate,
    records: Vec<AttendanceDetail>,
) -> AttendanceChartResponse {
    let tally = AttendanceTally::from_statuses(records.iter().map(|d| &d.record.status));
    let items = records
        .into_iter()
        .map(|d| AttendanceChartItem {
            student_id: d.record.student_id,
            student_name: d.student_name,
            roll_number: d.roll_number,
            status: d.record.status,
        })
        .collect();

    AttendanceChartResponse {
        grade_id: grade.id,
        grade_name: grade.name,
        date,
        items,
        total: tally.total(),
        present: tally.present,
        absent: tally.absent,
        present_percentage: tally.present_percentage(),
        absent_percentage: tally.absent_percentage(),
    }
}

pub async fn attendance_chart(
    service: &AttendanceService,
    query: AttendanceChartParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let grade_id = match resolve_grade(&current, query.grade_id) {
        Ok(grade_id) => grade_id,
        Err(resp) => return Ok(resp),
    };

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

    match storage
        .list_grade_attendance_between(grade_id, query.date, query.date)
        .await
    {
        Ok(records) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            build_chart(grade, query.date, records),
            "Attendance chart retrieved successfully",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to load attendance",
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::entities::AttendanceStatus;
    use crate::models::attendance::requests::AttendanceEntry;
    use crate::services::test_support::{body_json, request_as};
    use crate::storage::sea_orm_storage::tests::{
        seed_grade, seed_student, seed_teacher, test_storage,
    };
    use actix_web::http::StatusCode;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_chart_counts_and_percentages() {
        let storage = Arc::new(test_storage().await);
        let grade = seed_grade(&storage, "Grade 10").await;
        let teacher = seed_teacher(&storage, "teach10", grade.id).await;
        let mut entries = Vec::new();
        for (i, status) in [
            AttendanceStatus::Present,
            AttendanceStatus::Present,
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
        ]
        .into_iter()
        .enumerate()
        {
            let student = seed_student(
                &storage,
                &format!("Pupil {i}"),
                &format!("G10-00{i}"),
                grade.id,
            )
            .await;
            entries.push(AttendanceEntry {
                student_id: student.id,
                status,
            });
        }
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        storage
            .mark_attendance_impl(grade.id, date, teacher.id, entries)
            .await
            .unwrap();

        let service = AttendanceService::with_storage(storage.clone());
        let resp = service
            .attendance_chart(
                AttendanceChartParams {
                    grade_id: None,
                    date,
                },
                &request_as(&teacher),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["grade_name"], "Grade 10");
        assert_eq!(body["data"]["total"], 4);
        assert_eq!(body["data"]["present_percentage"], 75.0);
        assert_eq!(body["data"]["absent_percentage"], 25.0);
        assert_eq!(body["data"]["items"][3]["status"], "absent");

        let resp = service
            .attendance_chart(
                AttendanceChartParams {
                    grade_id: None,
                    date: date.succ_opt().unwrap(),
                },
                &request_as(&teacher),
            )
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["total"], 0);
        assert_eq!(body["data"]["present_percentage"], 0.0);
    }
}

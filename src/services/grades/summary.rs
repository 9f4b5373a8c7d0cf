use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;

use super::GradeService;
use crate::models::attendance::entities::{AttendanceDetail, AttendanceTally};
use crate::models::attendance::requests::AttendanceRangeParams;
use crate::models::attendance::responses::StudentAttendanceSummary;
use crate::models::grades::responses::GradeAttendanceSummaryResponse;
use crate::models::students::entities::Student;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, ensure_date_range, ensure_grade_access, storage_error};

/// 按学生汇总考勤，没有记录的学生计为 0
pub(crate) fn summarize_students(
    students: &[Student],
    records: &[AttendanceDetail],
) -> Vec<StudentAttendanceSummary> {
    let mut tallies: HashMap<i64, AttendanceTally> = HashMap::new();
    for detail in records {
        tallies
            .entry(detail.record.student_id)
            .or_default()
            .add(detail.record.status);
    }

    students
        .iter()
        .map(|student| {
            StudentAttendanceSummary::new(
                student.id,
                student.name.clone(),
                student.roll_number.clone(),
                tallies.get(&student.id).copied().unwrap_or_default(),
            )
        })
        .collect()
}

pub async fn grade_attendance_summary(
    service: &GradeService,
    grade_id: i64,
    range: AttendanceRangeParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = ensure_grade_access(&current, grade_id) {
        return Ok(resp);
    }
    if let Err(resp) = ensure_date_range(range.from_date, range.to_date, ErrorCode::BadRequest) {
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

    let students = match storage.list_students_by_grade(grade_id).await {
        Ok(students) => students,
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::InternalServerError,
                "Failed to list students",
                &e,
            ));
        }
    };

    let records = match storage
        .list_grade_attendance_between(grade_id, range.from_date, range.to_date)
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

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        GradeAttendanceSummaryResponse {
            grade,
            from_date: range.from_date,
            to_date: range.to_date,
            students: summarize_students(&students, &records),
        },
        "Attendance summary retrieved successfully",
    )))
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

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[actix_web::test]
    async fn test_grade_summary_counts_per_student() {
        let storage = Arc::new(test_storage().await);
        let grade = seed_grade(&storage, "Grade 3").await;
        let teacher = seed_teacher(&storage, "teach03", grade.id).await;
        let asha = seed_student(&storage, "Asha", "G3-001", grade.id).await;
        let ravi = seed_student(&storage, "Ravi", "G3-002", grade.id).await;

        for (d, ravi_status) in [(3, AttendanceStatus::Present), (4, AttendanceStatus::Absent)] {
            storage
                .mark_attendance_impl(
                    grade.id,
                    day(d),
                    teacher.id,
                    vec![
                        AttendanceEntry {
                            student_id: asha.id,
                            status: AttendanceStatus::Present,
                        },
                        AttendanceEntry {
                            student_id: ravi.id,
                            status: ravi_status,
                        },
                    ],
                )
                .await
                .unwrap();
        }

        let service = GradeService::with_storage(storage.clone());
        let req = request_as(&teacher);
        let range = AttendanceRangeParams {
            from_date: day(1),
            to_date: day(31),
        };
        let resp = service.attendance_summary(grade.id, range, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        let students = &body["data"]["students"];
        assert_eq!(students[0]["student_name"], "Asha");
        assert_eq!(students[0]["attendance_percentage"], 100.0);
        assert_eq!(students[1]["present"], 1);
        assert_eq!(students[1]["absent"], 1);
        assert_eq!(students[1]["attendance_percentage"], 50.0);
    }

    #[actix_web::test]
    async fn test_grade_summary_rejects_inverted_range() {
        let storage = Arc::new(test_storage().await);
        let grade = seed_grade(&storage, "Grade 4").await;
        let service = GradeService::with_storage(storage.clone());
        let req = request_as(&staff(1, UserRole::Admin, None));

        let range = AttendanceRangeParams {
            from_date: day(10),
            to_date: day(1),
        };
        let resp = service.attendance_summary(grade.id, range, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_students_without_records_have_zero_percentage() {
        let now = chrono::Utc::now();
        let student = Student {
            id: 1,
            name: "Meera".to_string(),
            roll_number: "G1-001".to_string(),
            date_of_birth: None,
            grade_id: 1,
            created_at: now,
            updated_at: now,
        };
        let summary = summarize_students(&[student], &[]);
        assert_eq!(summary[0].total, 0);
        assert_eq!(summary[0].attendance_percentage, 0.0);
    }
}

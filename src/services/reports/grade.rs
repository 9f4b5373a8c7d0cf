use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::NaiveDate;

use super::{REPORT_TITLE, ReportService, generated_footer, pdf_response};
use crate::models::attendance::entities::AttendanceDetail;
use crate::models::grades::entities::Grade;
use crate::models::reports::requests::GradeReportQuery;
use crate::models::{ApiResponse, ErrorCode};
use crate::pdf::{ReportDocument, Table, TableColumn};
use crate::services::{current_user, ensure_date_range, ensure_grade_access, storage_error};

fn day_table() -> Table {
    Table::new(vec![
        TableColumn::new("Student Name", 3.0),
        TableColumn::new("Roll Number", 2.0),
        TableColumn::new("Grade", 2.0),
        TableColumn::new("Teacher", 3.0),
        TableColumn::new("Status", 1.5).centered(),
    ])
}

/// 记录按日期升序排列，每个日期一节
pub(crate) fn build_grade_report(
    grade: &Grade,
    from: NaiveDate,
    to: NaiveDate,
    records: &[AttendanceDetail],
) -> ReportDocument {
    let mut doc = ReportDocument::new(REPORT_TITLE).footer(generated_footer());
    doc.fields(vec![
        ("Grade", grade.name.clone()),
        ("Period", format!("{from} to {to}")),
    ])
    .spacer(4.0);

    if records.is_empty() {
        doc.text("No attendance recorded in this period.");
        return doc;
    }

    let mut current: Option<(NaiveDate, Table)> = None;
    for detail in records {
        let day = detail.record.attendance_date;
        if !matches!(&current, Some((date, _)) if *date == day) {
            if let Some((date, table)) = current.take() {
                doc.heading(format!("Date - {}", date.format("%Y-%m-%d")))
                    .table(table)
                    .spacer(4.0);
            }
            current = Some((day, day_table()));
        }
        if let Some((_, table)) = current.as_mut() {
            table.push_row([
                detail.student_name.clone(),
                detail.roll_number.clone(),
                detail.grade_name.clone(),
                detail.teacher_name.clone().unwrap_or_else(|| "-".to_string()),
                detail.record.status.label().to_string(),
            ]);
        }
    }
    if let Some((date, table)) = current {
        doc.heading(format!("Date - {}", date.format("%Y-%m-%d")))
            .table(table);
    }
    doc
}

pub async fn grade_report(
    service: &ReportService,
    query: GradeReportQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    if let Err(resp) = ensure_date_range(
        query.from_date,
        query.to_date,
        ErrorCode::ReportDateRangeInvalid,
    ) {
        return Ok(resp);
    }
    if let Err(resp) = ensure_grade_access(&current, query.grade_id) {
        return Ok(resp);
    }

    let storage = service.get_storage(request)?;

    let grade = match storage.get_grade_by_id(query.grade_id).await {
        Ok(Some(grade)) => grade,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::GradeNotFound,
                "Grade not found",
            )));
        }
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::ReportGenerationFailed,
                "Failed to get grade",
                &e,
            ));
        }
    };

    let records = match storage
        .list_grade_attendance_between(grade.id, query.from_date, query.to_date)
        .await
    {
        Ok(records) => records,
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::ReportGenerationFailed,
                "Failed to load attendance",
                &e,
            ));
        }
    };

    let doc = build_grade_report(&grade, query.from_date, query.to_date, &records);
    Ok(pdf_response(doc).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::entities::AttendanceStatus;
    use crate::models::attendance::requests::AttendanceEntry;
    use crate::models::users::entities::UserRole;
    use crate::pdf::Block;
    use crate::services::test_support::{request_as, staff};
    use crate::storage::sea_orm_storage::tests::{
        seed_grade, seed_student, seed_teacher, test_storage,
    };
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn headings(doc: &ReportDocument) -> Vec<&str> {
        doc.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading(h) => Some(h.as_str()),
                _ => None,
            })
            .collect()
    }

    #[actix_web::test]
    async fn test_grade_report_groups_by_date() {
        let storage = Arc::new(test_storage().await);
        let grade = seed_grade(&storage, "Grade 3").await;
        let teacher = seed_teacher(&storage, "teach03", grade.id).await;
        let a = seed_student(&storage, "Vik", "G3-001", grade.id).await;
        let b = seed_student(&storage, "Wen", "G3-002", grade.id).await;
        for d in [5, 3] {
            storage
                .mark_attendance_impl(
                    grade.id,
                    date(d),
                    teacher.id,
                    vec![
                        AttendanceEntry {
                            student_id: b.id,
                            status: AttendanceStatus::Absent,
                        },
                        AttendanceEntry {
                            student_id: a.id,
                            status: AttendanceStatus::Present,
                        },
                    ],
                )
                .await
                .unwrap();
        }
        let records = storage
            .list_grade_attendance_between_impl(grade.id, date(1), date(31))
            .await
            .unwrap();

        let doc = build_grade_report(&grade, date(1), date(31), &records);
        assert_eq!(headings(&doc), vec!["Date - 2025-03-03", "Date - 2025-03-05"]);

        let tables: Vec<&Table> = doc
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(tables.len(), 2);
        assert_eq!(
            tables[0].rows[0],
            vec!["Vik", "G3-001", "Grade 3", "teach03", "Present"]
        );
        assert_eq!(tables[0].rows[1][4], "Absent");
    }

    #[test]
    fn test_unknown_teacher_shown_as_dash() {
        let now = chrono::Utc::now();
        let grade = Grade {
            id: 1,
            name: "Grade 1".to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        let detail = AttendanceDetail {
            record: crate::models::attendance::entities::AttendanceRecord {
                id: 1,
                student_id: 1,
                teacher_id: None,
                attendance_date: date(2),
                status: AttendanceStatus::Present,
                created_at: now,
                updated_at: now,
            },
            student_name: "Xia".to_string(),
            roll_number: "G1-001".to_string(),
            grade_id: 1,
            grade_name: "Grade 1".to_string(),
            teacher_name: None,
        };
        let doc = build_grade_report(&grade, date(1), date(2), &[detail]);
        let table = doc
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .unwrap();
        assert_eq!(table.rows[0][3], "-");
    }

    #[actix_web::test]
    async fn test_grade_report_access() {
        let storage = Arc::new(test_storage().await);
        let grade = seed_grade(&storage, "Grade 4").await;
        let service = ReportService::with_storage(storage.clone());
        let query = |grade_id| GradeReportQuery {
            grade_id,
            from_date: date(1),
            to_date: date(7),
        };

        let teacher = request_as(&staff(3, UserRole::Teacher, Some(grade.id)));
        let resp = service.grade_report(query(grade.id + 1), &teacher).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let admin = request_as(&staff(1, UserRole::Admin, None));
        let resp = service.grade_report(query(grade.id + 1), &admin).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = service.grade_report(query(grade.id), &teacher).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

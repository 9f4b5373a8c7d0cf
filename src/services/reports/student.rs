use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::NaiveDate;

use super::{REPORT_TITLE, ReportService, generated_footer, pdf_response};
use crate::models::ErrorCode;
use crate::models::attendance::entities::AttendanceRecord;
use crate::models::reports::requests::StudentReportQuery;
use crate::models::students::entities::Student;
use crate::pdf::{ReportDocument, Table, TableColumn};
use crate::services::students::get::load_accessible_student;
use crate::services::{current_user, ensure_date_range, storage_error};

pub(crate) fn build_student_report(
    student: &Student,
    grade_name: &str,
    from: NaiveDate,
    to: NaiveDate,
    records: &[AttendanceRecord],
) -> ReportDocument {
    let mut table = Table::new(vec![
        TableColumn::new("Date", 1.0),
        TableColumn::new("Status", 1.0).centered(),
    ]);
    for record in records {
        table.push_row([
            record.attendance_date.format("%Y-%m-%d").to_string(),
            record.status.label().to_string(),
        ]);
    }

    let mut doc = ReportDocument::new(REPORT_TITLE).footer(generated_footer());
    doc.fields(vec![
        ("Student Name", student.name.clone()),
        ("Roll Number", student.roll_number.clone()),
        ("Grade", grade_name.to_string()),
        ("Period", format!("{from} to {to}")),
    ])
    .spacer(4.0)
    .heading("Attendance Details");
    if records.is_empty() {
        doc.text("No attendance recorded in this period.");
    } else {
        doc.table(table);
    }
    doc
}

pub async fn student_report(
    service: &ReportService,
    query: StudentReportQuery,
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

    let storage = service.get_storage(request)?;
    let student =
        match load_accessible_student(storage.as_ref(), &current, query.student_id).await {
            Ok(student) => student,
            Err(resp) => return Ok(resp),
        };

    let grade_name = match storage.get_grade_by_id(student.grade_id).await {
        Ok(grade) => grade.map(|g| g.name).unwrap_or_else(|| "-".to_string()),
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::ReportGenerationFailed,
                "Failed to get grade",
                &e,
            ));
        }
    };

    let records = match storage
        .list_student_attendance_between(student.id, query.from_date, query.to_date)
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

    let doc = build_student_report(
        &student,
        &grade_name,
        query.from_date,
        query.to_date,
        &records,
    );
    Ok(pdf_response(doc).await)
}

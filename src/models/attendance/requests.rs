use std::collections::HashSet;

use super::entities::AttendanceStatus;
use crate::models::common::PaginationQuery;
use crate::models::common::pagination::deserialize_optional_i64;
use crate::models::students::entities::Student;
use serde::Deserialize;

// 单个学生的考勤条目
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceEntry {
    pub student_id: i64,
    pub status: AttendanceStatus,
}

// 提交某年级某日的考勤表
#[derive(Debug, Deserialize)]
pub struct MarkAttendanceRequest {
    /// 教师可省略，默认为其负责的年级
    pub grade_id: Option<i64>,
    pub date: chrono::NaiveDate,
    pub records: Vec<AttendanceEntry>,
}

/// 考勤表必须恰好覆盖年级内的每个学生一次
pub(crate) fn validate_sheet(
    grade_students: &[Student],
    entries: &[AttendanceEntry],
) -> Result<(), String> {
    if entries.is_empty() {
        return Err("Attendance records must not be empty".to_string());
    }

    let roster: HashSet<i64> = grade_students.iter().map(|s| s.id).collect();
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.student_id) {
            return Err(format!(
                "Student {} appears more than once",
                entry.student_id
            ));
        }
        if !roster.contains(&entry.student_id) {
            return Err(format!(
                "Student {} does not belong to this grade",
                entry.student_id
            ));
        }
    }

    let missing: Vec<String> = grade_students
        .iter()
        .filter(|s| !seen.contains(&s.id))
        .map(|s| s.roll_number.clone())
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "Attendance is missing for: {}",
            missing.join(", ")
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub status: AttendanceStatus,
}

// 考勤列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize)]
pub struct AttendanceListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub grade_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub student_id: Option<i64>,
    pub date: Option<chrono::NaiveDate>,
    pub from_date: Option<chrono::NaiveDate>,
    pub to_date: Option<chrono::NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

// 考勤列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct AttendanceListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub grade_id: Option<i64>,
    pub student_id: Option<i64>,
    pub date: Option<chrono::NaiveDate>,
    pub from_date: Option<chrono::NaiveDate>,
    pub to_date: Option<chrono::NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

impl From<AttendanceListParams> for AttendanceListQuery {
    fn from(params: AttendanceListParams) -> Self {
        Self {
            page: Some(params.pagination.page),
            size: Some(params.pagination.size),
            grade_id: params.grade_id,
            student_id: params.student_id,
            date: params.date,
            from_date: params.from_date,
            to_date: params.to_date,
            status: params.status,
        }
    }
}

// 考勤图表查询参数
#[derive(Debug, Deserialize)]
pub struct AttendanceChartParams {
    pub grade_id: Option<i64>,
    pub date: chrono::NaiveDate,
}

// 日期范围参数（汇总接口使用）
#[derive(Debug, Deserialize)]
pub struct AttendanceRangeParams {
    pub from_date: chrono::NaiveDate,
    pub to_date: chrono::NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_request_parses_records() {
        let req: MarkAttendanceRequest = serde_json::from_str(
            r#"{"date":"2025-03-10","records":[{"student_id":1,"status":"present"},{"student_id":2,"status":"Absent"}]}"#,
        )
        .unwrap();
        assert_eq!(req.grade_id, None);
        assert_eq!(req.records.len(), 2);
        assert_eq!(req.records[1].status, AttendanceStatus::Absent);
    }

    #[test]
    fn test_mark_request_rejects_bad_date() {
        let result = serde_json::from_str::<MarkAttendanceRequest>(
            r#"{"date":"10/03/2025","records":[]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_list_params_with_filters() {
        let params = actix_web::web::Query::<AttendanceListParams>::from_query(
            "page=1&size=20&grade_id=4&from_date=2025-03-01&to_date=2025-03-31&status=absent",
        )
        .unwrap()
        .into_inner();
        let query = AttendanceListQuery::from(params);
        assert_eq!(query.grade_id, Some(4));
        assert_eq!(query.size, Some(20));
        assert_eq!(query.status, Some(AttendanceStatus::Absent));
        assert_eq!(
            query.from_date,
            chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
        );
    }

    fn roster(ids: &[i64]) -> Vec<Student> {
        let now = chrono::Utc::now();
        ids.iter()
            .map(|&id| Student {
                id,
                name: format!("Student {id}"),
                roll_number: format!("R-{id}"),
                date_of_birth: None,
                grade_id: 1,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }

    fn entry(student_id: i64, status: AttendanceStatus) -> AttendanceEntry {
        AttendanceEntry { student_id, status }
    }

    #[test]
    fn test_validate_sheet() {
        let students = roster(&[1, 2]);
        let complete = [
            entry(1, AttendanceStatus::Present),
            entry(2, AttendanceStatus::Absent),
        ];
        assert!(validate_sheet(&students, &complete).is_ok());

        assert!(validate_sheet(&students, &[]).is_err());

        let duplicate = [
            entry(1, AttendanceStatus::Present),
            entry(1, AttendanceStatus::Absent),
        ];
        assert!(
            validate_sheet(&students, &duplicate)
                .unwrap_err()
                .contains("more than once")
        );

        let foreign = [
            entry(1, AttendanceStatus::Present),
            entry(2, AttendanceStatus::Present),
            entry(9, AttendanceStatus::Present),
        ];
        assert!(
            validate_sheet(&students, &foreign)
                .unwrap_err()
                .contains("does not belong")
        );

        let incomplete = [entry(1, AttendanceStatus::Present)];
        assert_eq!(
            validate_sheet(&students, &incomplete).unwrap_err(),
            "Attendance is missing for: R-2"
        );
    }
}

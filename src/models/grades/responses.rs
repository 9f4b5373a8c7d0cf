use super::entities::Grade;
use crate::models::attendance::responses::StudentAttendanceSummary;
use crate::models::common::PaginationInfo;
use serde::Serialize;

// 年级详情（附带学生人数）
#[derive(Debug, Serialize)]
pub struct GradeResponse {
    #[serde(flatten)]
    pub grade: Grade,
    pub student_count: i64,
}

#[derive(Debug, Serialize)]
pub struct GradeListResponse {
    pub items: Vec<Grade>,
    pub pagination: PaginationInfo,
}

// 年级在日期范围内的考勤汇总
#[derive(Debug, Serialize)]
pub struct GradeAttendanceSummaryResponse {
    pub grade: Grade,
    pub from_date: chrono::NaiveDate,
    pub to_date: chrono::NaiveDate,
    pub students: Vec<StudentAttendanceSummary>,
}

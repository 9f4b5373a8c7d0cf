use super::entities::{AttendanceDetail, AttendanceRecord, AttendanceStatus, AttendanceTally};
use crate::models::common::PaginationInfo;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MarkAttendanceResponse {
    pub grade_id: i64,
    pub date: chrono::NaiveDate,
    pub items: Vec<AttendanceRecord>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceListResponse {
    pub items: Vec<AttendanceDetail>,
    pub pagination: PaginationInfo,
}

// 考勤图表中的单个学生
#[derive(Debug, Serialize)]
pub struct AttendanceChartItem {
    pub student_id: i64,
    pub student_name: String,
    pub roll_number: String,
    pub status: AttendanceStatus,
}

// 某年级某日的考勤图表
#[derive(Debug, Serialize)]
pub struct AttendanceChartResponse {
    pub grade_id: i64,
    pub grade_name: String,
    pub date: chrono::NaiveDate,
    pub items: Vec<AttendanceChartItem>,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub present_percentage: f64,
    pub absent_percentage: f64,
}

// 单个学生的考勤统计
#[derive(Debug, Clone, Serialize)]
pub struct StudentAttendanceSummary {
    pub student_id: i64,
    pub student_name: String,
    pub roll_number: String,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub attendance_percentage: f64,
}

impl StudentAttendanceSummary {
    pub fn new(student_id: i64, student_name: String, roll_number: String, tally: AttendanceTally) -> Self {
        Self {
            student_id,
            student_name,
            roll_number,
            total: tally.total(),
            present: tally.present,
            absent: tally.absent,
            attendance_percentage: tally.present_percentage(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudentAttendanceSummaryResponse {
    pub from_date: chrono::NaiveDate,
    pub to_date: chrono::NaiveDate,
    #[serde(flatten)]
    pub summary: StudentAttendanceSummary,
}

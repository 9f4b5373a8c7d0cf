use serde::Deserialize;

// 学生考勤报表参数
#[derive(Debug, Deserialize)]
pub struct StudentReportQuery {
    pub student_id: i64,
    pub from_date: chrono::NaiveDate,
    pub to_date: chrono::NaiveDate,
}

// 年级考勤报表参数
#[derive(Debug, Deserialize)]
pub struct GradeReportQuery {
    pub grade_id: i64,
    pub from_date: chrono::NaiveDate,
    pub to_date: chrono::NaiveDate,
}

use crate::models::common::PaginationQuery;
use crate::models::common::pagination::deserialize_optional_i64;
use serde::Deserialize;

// 学生列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize)]
pub struct StudentListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub grade_id: Option<i64>,
    /// 按姓名或学号搜索
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub name: String,
    pub roll_number: String,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub grade_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub roll_number: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub grade_id: Option<i64>,
}

// 学生列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct StudentListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub grade_id: Option<i64>,
    pub search: Option<String>,
}

impl From<StudentListParams> for StudentListQuery {
    fn from(params: StudentListParams) -> Self {
        Self {
            page: Some(params.pagination.page),
            size: Some(params.pagination.size),
            grade_id: params.grade_id,
            search: params.search,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_student_parses_date_of_birth() {
        let req: CreateStudentRequest = serde_json::from_str(
            r#"{"name":"Asha","roll_number":"G5-001","date_of_birth":"2015-04-09","grade_id":5}"#,
        )
        .unwrap();
        assert_eq!(
            req.date_of_birth,
            chrono::NaiveDate::from_ymd_opt(2015, 4, 9)
        );
    }

    #[test]
    fn test_list_params_empty_grade_filter() {
        let params =
            actix_web::web::Query::<StudentListParams>::from_query("grade_id=&search=asha")
                .unwrap()
                .into_inner();
        assert_eq!(params.grade_id, None);
        assert_eq!(params.pagination.page, 1);
        assert_eq!(params.search.as_deref(), Some("asha"));
    }
}

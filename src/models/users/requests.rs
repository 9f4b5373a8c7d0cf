use super::entities::{UserRole, UserStatus};
use crate::models::common::PaginationQuery;
use crate::models::common::pagination::deserialize_optional_i64;
use serde::Deserialize;

// 用户查询参数（来自HTTP请求）
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub grade_id: Option<i64>,
    pub search: Option<String>,
}

// 用户创建请求
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub display_name: Option<String>,
    /// 教师必须指定负责的年级
    pub grade_id: Option<i64>,
    pub qualification: Option<String>,
}

// 用户更新请求
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub display_name: Option<String>,
    pub grade_id: Option<i64>,
    pub qualification: Option<String>,
}

// 用户列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub grade_id: Option<i64>,
    pub search: Option<String>,
}

impl From<UserListParams> for UserListQuery {
    fn from(params: UserListParams) -> Self {
        Self {
            page: Some(params.pagination.page),
            size: Some(params.pagination.size),
            role: params.role,
            status: params.status,
            grade_id: params.grade_id,
            search: params.search,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_from_query_string() {
        let params = actix_web::web::Query::<UserListParams>::from_query(
            "page=2&size=5&role=teacher&grade_id=3&search=rao",
        )
        .unwrap();
        let query = UserListQuery::from(params.into_inner());
        assert_eq!(query.page, Some(2));
        assert_eq!(query.size, Some(5));
        assert_eq!(query.role, Some(UserRole::Teacher));
        assert_eq!(query.grade_id, Some(3));
        assert_eq!(query.search.as_deref(), Some("rao"));
    }

    #[test]
    fn test_create_request_rejects_unknown_role() {
        let body = r#"{"username":"teach01","email":"t@school.test","password":"Passw0rd","role":"user"}"#;
        assert!(serde_json::from_str::<CreateUserRequest>(body).is_err());
    }
}

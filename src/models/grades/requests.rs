use crate::models::common::PaginationQuery;
use serde::Deserialize;

// 年级列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize)]
pub struct GradeListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

// 创建年级请求
#[derive(Debug, Deserialize)]
pub struct CreateGradeRequest {
    pub name: String,
    pub description: Option<String>,
}

// 更新年级请求
#[derive(Debug, Deserialize)]
pub struct UpdateGradeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

// 年级列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct GradeListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub search: Option<String>,
    /// 仅返回指定年级（教师视角）
    pub grade_id: Option<i64>,
}

impl From<GradeListParams> for GradeListQuery {
    fn from(params: GradeListParams) -> Self {
        Self {
            page: Some(params.pagination.page),
            size: Some(params.pagination.size),
            search: params.search,
            grade_id: None,
        }
    }
}

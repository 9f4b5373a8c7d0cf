pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod summary;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::attendance::requests::AttendanceRangeParams;
use crate::models::grades::requests::{CreateGradeRequest, GradeListParams, UpdateGradeRequest};
use crate::storage::Storage;

pub struct GradeService {
    storage: Option<Arc<dyn Storage>>,
}

impl GradeService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::resolve_storage(self.storage.as_ref(), request)
    }

    pub async fn list_grades(
        &self,
        query: GradeListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_grades(self, query, request).await
    }

    pub async fn create_grade(
        &self,
        grade_data: CreateGradeRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_grade(self, grade_data, request).await
    }

    pub async fn get_grade(
        &self,
        grade_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        get::get_grade(self, grade_id, request).await
    }

    pub async fn update_grade(
        &self,
        grade_id: i64,
        update_data: UpdateGradeRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_grade(self, grade_id, update_data, request).await
    }

    pub async fn delete_grade(
        &self,
        grade_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_grade(self, grade_id, request).await
    }

    // 年级在日期范围内的考勤汇总
    pub async fn attendance_summary(
        &self,
        grade_id: i64,
        range: AttendanceRangeParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        summary::grade_attendance_summary(self, grade_id, range, request).await
    }
}

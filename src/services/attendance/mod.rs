pub mod chart;
pub mod delete;
pub mod list;
pub mod mark;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use std::sync::Arc;

use crate::models::ErrorCode;
use crate::models::attendance::requests::{
    AttendanceChartParams, AttendanceListParams, MarkAttendanceRequest, UpdateAttendanceRequest,
};
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;

use super::{ensure_grade_access, error_response};

pub struct AttendanceService {
    storage: Option<Arc<dyn Storage>>,
}

impl AttendanceService {
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

    // 提交某年级某日的整张考勤表
    pub async fn mark_attendance(
        &self,
        sheet: MarkAttendanceRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        mark::mark_attendance(self, sheet, request).await
    }

    pub async fn list_attendance(
        &self,
        query: AttendanceListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_attendance(self, query, request).await
    }

    pub async fn update_attendance(
        &self,
        attendance_id: i64,
        update_data: UpdateAttendanceRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_attendance(self, attendance_id, update_data, request).await
    }

    pub async fn delete_attendance(
        &self,
        attendance_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_attendance(self, attendance_id, request).await
    }

    pub async fn attendance_chart(
        &self,
        query: AttendanceChartParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        chart::attendance_chart(self, query, request).await
    }
}

/// 确定操作的年级：教师默认自己的年级，管理员必须指定
pub(crate) fn resolve_grade(user: &User, requested: Option<i64>) -> Result<i64, HttpResponse> {
    match (&user.role, requested) {
        (_, Some(grade_id)) => {
            ensure_grade_access(user, grade_id)?;
            Ok(grade_id)
        }
        (UserRole::Teacher, None) => user.grade_id.ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::TeacherGradeRequired,
                "No grade is assigned to this account",
            )
        }),
        (UserRole::Admin, None) => Err(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::BadRequest,
            "grade_id is required",
        )),
    }
}

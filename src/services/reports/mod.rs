//! 考勤报表导出服务

pub mod grade;
pub mod student;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header, web};
use std::sync::Arc;
use tracing::error;

use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::reports::requests::{GradeReportQuery, StudentReportQuery};
use crate::pdf::{PageSetup, ReportDocument, render_report};
use crate::storage::Storage;

use super::error_response;

pub(crate) const REPORT_TITLE: &str = "Attendance Report";

pub struct ReportService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReportService {
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

    // 单个学生的考勤明细
    pub async fn student_report(
        &self,
        query: StudentReportQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        student::student_report(self, query, request).await
    }

    // 年级按日期分组的考勤明细
    pub async fn grade_report(
        &self,
        query: GradeReportQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        grade::grade_report(self, query, request).await
    }
}

/// 在阻塞线程池中排版渲染，返回内联 PDF 响应
pub(crate) async fn pdf_response(doc: ReportDocument) -> HttpResponse {
    let report = &AppConfig::get().report;
    let setup = PageSetup::from_config(report);

    let rendered = web::block(move || render_report(&doc, &setup)).await;
    let bytes = match rendered {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            error!("Failed to render report: {}", e);
            return error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::ReportGenerationFailed,
                "Failed to generate report",
            );
        }
        Err(e) => {
            error!("Report rendering task failed: {}", e);
            return error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::ReportGenerationFailed,
                "Failed to generate report",
            );
        }
    };

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "application/pdf"))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", report.file_name.replace('"', "")),
        ))
        .body(bytes)
}

/// 报表页脚
pub(crate) fn generated_footer() -> String {
    format!(
        "Generated {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M")
    )
}

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::reports::requests::{GradeReportQuery, StudentReportQuery};
use crate::services::ReportService;

// 懒加载的全局 ReportService 实例
static REPORT_SERVICE: Lazy<ReportService> = Lazy::new(ReportService::new_lazy);

pub async fn student_report(
    req: HttpRequest,
    query: web::Query<StudentReportQuery>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE.student_report(query.into_inner(), &req).await
}

pub async fn grade_report(
    req: HttpRequest,
    query: web::Query<GradeReportQuery>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE.grade_report(query.into_inner(), &req).await
}

// 配置路由
pub fn configure_report_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/reports")
            // 先认证，再按用户限流
            .wrap(middlewares::RateLimit::reports())
            .wrap(middlewares::RequireJWT)
            .route("/student", web::get().to(student_report))
            .route("/grade", web::get().to(grade_report)),
    );
}

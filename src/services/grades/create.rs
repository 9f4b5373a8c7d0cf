use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::GradeService;
use crate::models::grades::requests::CreateGradeRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error;
use crate::utils::validate::validate_display_text;

pub(crate) const GRADE_NAME_MAX: usize = 64;

pub async fn create_grade(
    service: &GradeService,
    mut grade_data: CreateGradeRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = validate_display_text(&grade_data.name, "Grade name", GRADE_NAME_MAX) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::GradeNameInvalid, msg)));
    }
    grade_data.name = grade_data.name.trim().to_string();

    let storage = service.get_storage(request)?;

    match storage.get_grade_by_name(&grade_data.name).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::GradeAlreadyExists,
                format!("Grade '{}' already exists", grade_data.name),
            )));
        }
        Ok(None) => {}
        Err(e) => {
            return Ok(storage_error(
                ErrorCode::InternalServerError,
                "Failed to create grade",
                &e,
            ));
        }
    }

    match storage.create_grade(grade_data).await {
        Ok(grade) => {
            info!("Grade {} created", grade.name);
            Ok(HttpResponse::Created().json(ApiResponse::success(grade, "Grade created successfully")))
        }
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to create grade",
            &e,
        )),
    }
}

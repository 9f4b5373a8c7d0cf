use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::GradeService;
use super::create::GRADE_NAME_MAX;
use crate::models::grades::requests::UpdateGradeRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error;
use crate::utils::validate::validate_display_text;

pub async fn update_grade(
    service: &GradeService,
    grade_id: i64,
    mut update_data: UpdateGradeRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if let Some(name) = update_data.name.as_mut() {
        if let Err(msg) = validate_display_text(name, "Grade name", GRADE_NAME_MAX) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::GradeNameInvalid, msg)));
        }
        *name = name.trim().to_string();

        match storage.get_grade_by_name(name).await {
            Ok(Some(existing)) if existing.id != grade_id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::GradeAlreadyExists,
                    format!("Grade '{name}' already exists"),
                )));
            }
            Ok(_) => {}
            Err(e) => {
                return Ok(storage_error(
                    ErrorCode::InternalServerError,
                    "Failed to update grade",
                    &e,
                ));
            }
        }
    }

    match storage.update_grade(grade_id, update_data).await {
        Ok(Some(grade)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(grade, "Grade updated successfully")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::GradeNotFound,
            "Grade not found",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to update grade",
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::{body_json, request_as, staff};
    use crate::storage::sea_orm_storage::tests::{seed_grade, test_storage};
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_rename_grade() {
        let storage = Arc::new(test_storage().await);
        let grade = seed_grade(&storage, "Grade 7").await;
        seed_grade(&storage, "Grade 8").await;
        let service = GradeService::with_storage(storage.clone());
        let req = request_as(&staff(1, UserRole::Admin, None));

        let taken = UpdateGradeRequest {
            name: Some("Grade 8".to_string()),
            description: None,
        };
        let resp = service.update_grade(grade.id, taken, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        // 保持原名不算冲突
        let same = UpdateGradeRequest {
            name: Some("Grade 7".to_string()),
            description: Some("Section A".to_string()),
        };
        let resp = service.update_grade(grade.id, same, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["data"]["description"], "Section A");
    }
}

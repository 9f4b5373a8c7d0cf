use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use super::create::{ensure_grade_exists, ensure_roll_number_free, validate_student_fields};
use crate::models::students::requests::UpdateStudentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::storage_error;

pub async fn update_student(
    service: &StudentService,
    student_id: i64,
    update_data: UpdateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(resp) = validate_student_fields(
        update_data.name.as_deref(),
        update_data.roll_number.as_deref(),
        update_data.date_of_birth,
    ) {
        return Ok(resp);
    }

    let storage = service.get_storage(request)?;

    if let Some(grade_id) = update_data.grade_id
        && let Err(resp) = ensure_grade_exists(storage.as_ref(), grade_id).await
    {
        return Ok(resp);
    }
    if let Some(roll_number) = update_data.roll_number.as_deref()
        && let Err(resp) =
            ensure_roll_number_free(storage.as_ref(), roll_number, Some(student_id)).await
    {
        return Ok(resp);
    }

    match storage.update_student(student_id, update_data).await {
        Ok(Some(student)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            student,
            "Student updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotFound,
            "Student not found",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to update student",
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::test_support::{body_json, request_as, staff};
    use crate::storage::sea_orm_storage::tests::{seed_grade, seed_student, test_storage};
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_move_student_between_grades() {
        let storage = Arc::new(test_storage().await);
        let from = seed_grade(&storage, "Grade 3").await;
        let to = seed_grade(&storage, "Grade 4").await;
        let kiran = seed_student(&storage, "Kiran", "G3-001", from.id).await;
        seed_student(&storage, "Lata", "G4-001", to.id).await;
        let service = StudentService::with_storage(storage.clone());
        let req = request_as(&staff(1, UserRole::Admin, None));

        let taken = UpdateStudentRequest {
            name: None,
            roll_number: Some("G4-001".to_string()),
            date_of_birth: None,
            grade_id: None,
        };
        let resp = service.update_student(kiran.id, taken, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let moved = UpdateStudentRequest {
            name: None,
            roll_number: Some("G4-002".to_string()),
            date_of_birth: None,
            grade_id: Some(to.id),
        };
        let resp = service.update_student(kiran.id, moved, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["grade_id"], to.id);
        assert_eq!(body["data"]["roll_number"], "G4-002");
    }
}

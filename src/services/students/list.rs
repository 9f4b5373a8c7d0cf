use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::models::students::requests::{StudentListParams, StudentListQuery};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, ensure_grade_access, storage_error};

pub async fn list_students(
    service: &StudentService,
    query: StudentListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let current = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let mut list_query = StudentListQuery::from(query);
    if current.role == UserRole::Teacher {
        match list_query.grade_id {
            Some(grade_id) => {
                if let Err(resp) = ensure_grade_access(&current, grade_id) {
                    return Ok(resp);
                }
            }
            None => list_query.grade_id = Some(current.grade_id.unwrap_or(0)),
        }
    }

    let storage = service.get_storage(request)?;

    match storage.list_students_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Student list retrieved successfully",
        ))),
        Err(e) => Ok(storage_error(
            ErrorCode::InternalServerError,
            "Failed to retrieve student list",
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::PaginationQuery;
    use crate::services::test_support::{body_json, request_as, staff};
    use crate::storage::sea_orm_storage::tests::{seed_grade, seed_student, test_storage};
    use actix_web::http::StatusCode;
    use std::sync::Arc;

    fn params(grade_id: Option<i64>, search: Option<&str>) -> StudentListParams {
        StudentListParams {
            pagination: PaginationQuery::default(),
            grade_id,
            search: search.map(str::to_string),
        }
    }

    #[actix_web::test]
    async fn test_teacher_list_is_scoped_to_grade() {
        let storage = Arc::new(test_storage().await);
        let own = seed_grade(&storage, "Grade 1").await;
        let other = seed_grade(&storage, "Grade 2").await;
        seed_student(&storage, "Farah", "G1-001", own.id).await;
        seed_student(&storage, "Gopal", "G1-002", own.id).await;
        seed_student(&storage, "Hana", "G2-001", other.id).await;
        let service = StudentService::with_storage(storage.clone());

        let teacher = request_as(&staff(4, UserRole::Teacher, Some(own.id)));
        let body = body_json(service.list_students(params(None, None), &teacher).await.unwrap()).await;
        assert_eq!(body["data"]["pagination"]["total"], 2);

        let resp = service
            .list_students(params(Some(other.id), None), &teacher)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let admin = request_as(&staff(1, UserRole::Admin, None));
        let body = body_json(
            service
                .list_students(params(None, Some("G2-")), &admin)
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["data"]["pagination"]["total"], 1);
        assert_eq!(body["data"]["items"][0]["name"], "Hana");
    }
}

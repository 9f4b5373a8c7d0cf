//! 年级存储操作

use super::SeaOrmStorage;
use crate::entity::grades::{ActiveModel, Column, Entity as Grades};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    PaginationInfo,
    grades::{
        entities::Grade,
        requests::{CreateGradeRequest, GradeListQuery, UpdateGradeRequest},
        responses::GradeListResponse,
    },
};
use crate::utils::like_contains;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 在事务内锁定年级行 (`FOR UPDATE`)，年级不存在时返回 false
    ///
    /// 学生写入与考勤录入都先取这把锁，两者因此串行。SQLite 没有行锁，
    /// 由其单写者事务保证同样的效果。
    pub(super) async fn lock_grade<C: ConnectionTrait>(conn: &C, grade_id: i64) -> Result<bool> {
        let grade = Grades::find_by_id(grade_id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("锁定年级失败: {e}")))?;
        Ok(grade.is_some())
    }

    pub async fn create_grade_impl(&self, req: CreateGradeRequest) -> Result<Grade> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name.trim().to_string()),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("创建年级失败: {e}")))?;

        Ok(result.into_grade())
    }

    pub async fn get_grade_by_id_impl(&self, grade_id: i64) -> Result<Option<Grade>> {
        let result = Grades::find_by_id(grade_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询年级失败: {e}")))?;

        Ok(result.map(|m| m.into_grade()))
    }

    pub async fn get_grade_by_name_impl(&self, name: &str) -> Result<Option<Grade>> {
        let result = Grades::find()
            .filter(Column::Name.eq(name.trim()))
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询年级失败: {e}")))?;

        Ok(result.map(|m| m.into_grade()))
    }

    /// 分页列出年级，按名称排序
    pub async fn list_grades_with_pagination_impl(
        &self,
        query: GradeListQuery,
    ) -> Result<GradeListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Grades::find();

        if let Some(grade_id) = query.grade_id {
            select = select.filter(Column::Id.eq(grade_id));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            select = select.filter(Column::Name.like(like_contains(search.trim())));
        }

        select = select.order_by_asc(Column::Name);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询年级总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询年级页数失败: {e}")))?;

        let grades = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询年级列表失败: {e}")))?;

        Ok(GradeListResponse {
            items: grades.into_iter().map(|m| m.into_grade()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    pub async fn update_grade_impl(
        &self,
        grade_id: i64,
        update: UpdateGradeRequest,
    ) -> Result<Option<Grade>> {
        if self.get_grade_by_id_impl(grade_id).await?.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(grade_id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }

        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("更新年级失败: {e}")))?;

        self.get_grade_by_id_impl(grade_id).await
    }

    /// 删除年级；仍有学生的年级由外键阻止，调用方应先检查
    pub async fn delete_grade_impl(&self, grade_id: i64) -> Result<bool> {
        let result = Grades::delete_by_id(grade_id)
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("删除年级失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_students_in_grade_impl(&self, grade_id: i64) -> Result<u64> {
        let count = Students::find()
            .filter(StudentColumn::GradeId.eq(grade_id))
            .count(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("统计年级学生数失败: {e}")))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::tests::{seed_grade, seed_student, test_storage};

    #[tokio::test]
    async fn test_grade_name_is_unique() {
        let storage = test_storage().await;
        seed_grade(&storage, "Grade 3").await;
        let duplicate = storage
            .create_grade_impl(CreateGradeRequest {
                name: "Grade 3".to_string(),
                description: None,
            })
            .await;
        assert!(duplicate.is_err());
        assert!(
            storage
                .get_grade_by_name_impl(" Grade 3 ")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_grade_with_students_cannot_be_deleted() {
        let storage = test_storage().await;
        let grade = seed_grade(&storage, "Grade 4").await;
        seed_student(&storage, "Asha", "G4-001", grade.id).await;

        assert_eq!(storage.count_students_in_grade_impl(grade.id).await.unwrap(), 1);
        assert!(storage.delete_grade_impl(grade.id).await.is_err());

        let empty = seed_grade(&storage, "Grade 9").await;
        assert!(storage.delete_grade_impl(empty.id).await.unwrap());
        assert!(storage.get_grade_by_id_impl(empty.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_grades_restricted_to_one() {
        let storage = test_storage().await;
        seed_grade(&storage, "Grade 1").await;
        let second = seed_grade(&storage, "Grade 2").await;

        let all = storage
            .list_grades_with_pagination_impl(GradeListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);
        assert_eq!(all.items[0].name, "Grade 1");

        let own = storage
            .list_grades_with_pagination_impl(GradeListQuery {
                grade_id: Some(second.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(own.items.len(), 1);
        assert_eq!(own.items[0].id, second.id);
    }
}

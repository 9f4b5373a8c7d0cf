//! 学生存储操作

use super::SeaOrmStorage;
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    PaginationInfo,
    students::{
        entities::Student,
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
};
use crate::utils::like_contains;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    pub async fn create_student_impl(&self, req: CreateStudentRequest) -> Result<Student> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name.trim().to_string()),
            roll_number: Set(req.roll_number.trim().to_string()),
            date_of_birth: Set(req.date_of_birth),
            grade_id: Set(req.grade_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        // 与考勤录入共用年级行锁，避免考勤表漏掉新加入的学生
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("开启事务失败: {e}")))?;
        if !Self::lock_grade(&txn, req.grade_id).await? {
            return Err(AttendanceError::validation(format!(
                "Grade {} does not exist",
                req.grade_id
            )));
        }

        let result = model
            .insert(&txn)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("创建学生失败: {e}")))?;
        txn.commit()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.into_student())
    }

    pub async fn get_student_by_id_impl(&self, student_id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    pub async fn get_student_by_roll_number_impl(
        &self,
        roll_number: &str,
    ) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(Column::RollNumber.eq(roll_number.trim()))
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    pub async fn list_students_with_pagination_impl(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Students::find();

        if let Some(grade_id) = query.grade_id {
            select = select.filter(Column::GradeId.eq(grade_id));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let search = search.trim();
            select = select.filter(
                Condition::any()
                    .add(Column::Name.like(like_contains(search)))
                    .add(Column::RollNumber.like(like_contains(search))),
            );
        }

        select = select
            .order_by_asc(Column::GradeId)
            .order_by_asc(Column::RollNumber);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生页数失败: {e}")))?;

        let students = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生列表失败: {e}")))?;

        Ok(StudentListResponse {
            items: students.into_iter().map(|m| m.into_student()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 年级全部学生，按学号排序
    pub async fn list_students_by_grade_impl(&self, grade_id: i64) -> Result<Vec<Student>> {
        Self::students_of_grade(&self.db, grade_id).await
    }

    pub(super) async fn students_of_grade<C: ConnectionTrait>(
        conn: &C,
        grade_id: i64,
    ) -> Result<Vec<Student>> {
        let students = Students::find()
            .filter(Column::GradeId.eq(grade_id))
            .order_by_asc(Column::RollNumber)
            .all(conn)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询年级学生失败: {e}")))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }

    pub async fn update_student_impl(
        &self,
        student_id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        if self.get_student_by_id_impl(student_id).await?.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(student_id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }

        if let Some(roll_number) = update.roll_number {
            model.roll_number = Set(roll_number.trim().to_string());
        }

        if let Some(date_of_birth) = update.date_of_birth {
            model.date_of_birth = Set(Some(date_of_birth));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("开启事务失败: {e}")))?;
        if let Some(grade_id) = update.grade_id {
            if !Self::lock_grade(&txn, grade_id).await? {
                return Err(AttendanceError::validation(format!(
                    "Grade {grade_id} does not exist"
                )));
            }
            model.grade_id = Set(grade_id);
        }

        model
            .update(&txn)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("更新学生失败: {e}")))?;
        txn.commit()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("提交事务失败: {e}")))?;

        self.get_student_by_id_impl(student_id).await
    }

    /// 删除学生，考勤记录随外键级联删除
    pub async fn delete_student_impl(&self, student_id: i64) -> Result<bool> {
        let result = Students::delete_by_id(student_id)
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("删除学生失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

use std::sync::Arc;

use chrono::NaiveDate;

use crate::models::{
    attendance::{
        entities::{AttendanceDetail, AttendanceRecord, AttendanceStatus},
        requests::{AttendanceEntry, AttendanceListQuery},
        responses::AttendanceListResponse,
    },
    grades::{
        entities::Grade,
        requests::{CreateGradeRequest, GradeListQuery, UpdateGradeRequest},
        responses::GradeListResponse,
    },
    students::{
        entities::Student,
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（密码已哈希）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    async fn delete_user(&self, id: i64) -> Result<bool>;
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    async fn count_users(&self) -> Result<u64>;

    /// 年级管理方法
    async fn create_grade(&self, grade: CreateGradeRequest) -> Result<Grade>;
    async fn get_grade_by_id(&self, grade_id: i64) -> Result<Option<Grade>>;
    async fn get_grade_by_name(&self, name: &str) -> Result<Option<Grade>>;
    async fn list_grades_with_pagination(&self, query: GradeListQuery)
    -> Result<GradeListResponse>;
    async fn update_grade(
        &self,
        grade_id: i64,
        update: UpdateGradeRequest,
    ) -> Result<Option<Grade>>;
    async fn delete_grade(&self, grade_id: i64) -> Result<bool>;
    async fn count_students_in_grade(&self, grade_id: i64) -> Result<u64>;

    /// 学生管理方法
    async fn create_student(&self, student: CreateStudentRequest) -> Result<Student>;
    async fn get_student_by_id(&self, student_id: i64) -> Result<Option<Student>>;
    async fn get_student_by_roll_number(&self, roll_number: &str) -> Result<Option<Student>>;
    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse>;
    // 年级全部学生，按学号排序
    async fn list_students_by_grade(&self, grade_id: i64) -> Result<Vec<Student>>;
    async fn update_student(
        &self,
        student_id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>>;
    async fn delete_student(&self, student_id: i64) -> Result<bool>;

    /// 考勤管理方法
    // 事务写入整张考勤表
    async fn mark_attendance(
        &self,
        grade_id: i64,
        date: NaiveDate,
        teacher_id: i64,
        entries: Vec<AttendanceEntry>,
    ) -> Result<Vec<AttendanceRecord>>;
    async fn attendance_exists_for_grade_on(&self, grade_id: i64, date: NaiveDate)
    -> Result<bool>;
    async fn get_attendance_by_id(&self, id: i64) -> Result<Option<AttendanceDetail>>;
    async fn list_attendance_with_pagination(
        &self,
        query: AttendanceListQuery,
    ) -> Result<AttendanceListResponse>;
    async fn update_attendance_status(
        &self,
        id: i64,
        status: AttendanceStatus,
    ) -> Result<Option<AttendanceRecord>>;
    async fn delete_attendance(&self, id: i64) -> Result<bool>;
    // 闭区间查询，日期升序
    async fn list_student_attendance_between(
        &self,
        student_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>>;
    async fn list_grade_attendance_between(
        &self,
        grade_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceDetail>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}

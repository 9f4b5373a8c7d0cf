//! 考勤存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::attendance::{
    ActiveModel, Column, Entity as Attendance, Model as AttendanceModel,
};
use crate::entity::grades::{Column as GradeColumn, Entity as Grades};
use crate::entity::students::{Column as StudentColumn, Entity as Students, Model as StudentModel};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    PaginationInfo,
    attendance::{
        entities::{AttendanceDetail, AttendanceRecord, AttendanceStatus},
        requests::{AttendanceEntry, AttendanceListQuery, validate_sheet},
        responses::AttendanceListResponse,
    },
    users::entities::User,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::debug;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl SeaOrmStorage {
    /// 在一个事务中写入某年级某日的整张考勤表
    ///
    /// 年级行加锁后读取名单并校验条目，不完整的考勤表返回 `Validation`；
    /// 当日已有记录或并发插入触发唯一索引时返回 `Conflict`。
    pub async fn mark_attendance_impl(
        &self,
        grade_id: i64,
        date: NaiveDate,
        teacher_id: i64,
        entries: Vec<AttendanceEntry>,
    ) -> Result<Vec<AttendanceRecord>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("开启事务失败: {e}")))?;

        if !Self::lock_grade(&txn, grade_id).await? {
            return Err(AttendanceError::validation(format!(
                "Grade {grade_id} does not exist"
            )));
        }
        let roster = Self::students_of_grade(&txn, grade_id).await?;
        validate_sheet(&roster, &entries).map_err(AttendanceError::validation)?;

        if Self::grade_has_attendance_on(&txn, grade_id, date).await? {
            return Err(AttendanceError::conflict(format!(
                "Attendance for grade {grade_id} already exists on {date}"
            )));
        }

        let now = chrono::Utc::now().timestamp();
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let model = ActiveModel {
                student_id: Set(entry.student_id),
                teacher_id: Set(Some(teacher_id)),
                attendance_date: Set(date),
                status: Set(entry.status.to_string()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            let inserted = model.insert(&txn).await.map_err(|e| {
                if is_unique_violation(&e) {
                    AttendanceError::conflict(format!(
                        "Attendance for student {} already exists on {date}",
                        entry.student_id
                    ))
                } else {
                    AttendanceError::database_operation(format!("写入考勤记录失败: {e}"))
                }
            })?;
            records.push(inserted.into_record());
        }

        txn.commit()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("提交考勤事务失败: {e}")))?;

        debug!(
            "Recorded {} attendance rows for grade {} on {}",
            records.len(),
            grade_id,
            date
        );
        Ok(records)
    }

    async fn grade_has_attendance_on<C: ConnectionTrait>(
        conn: &C,
        grade_id: i64,
        date: NaiveDate,
    ) -> Result<bool> {
        let count = Attendance::find()
            .inner_join(Students)
            .filter(StudentColumn::GradeId.eq(grade_id))
            .filter(Column::AttendanceDate.eq(date))
            .count(conn)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询考勤记录失败: {e}")))?;
        Ok(count > 0)
    }

    pub async fn attendance_exists_for_grade_on_impl(
        &self,
        grade_id: i64,
        date: NaiveDate,
    ) -> Result<bool> {
        Self::grade_has_attendance_on(&self.db, grade_id, date).await
    }

    pub async fn get_attendance_by_id_impl(&self, id: i64) -> Result<Option<AttendanceDetail>> {
        let row = Attendance::find_by_id(id)
            .find_also_related(Students)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询考勤记录失败: {e}")))?;

        match row {
            Some(row) => Ok(self.attach_details(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// 分页列出考勤记录，日期倒序
    pub async fn list_attendance_with_pagination_impl(
        &self,
        query: AttendanceListQuery,
    ) -> Result<AttendanceListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Attendance::find().find_also_related(Students);

        if let Some(grade_id) = query.grade_id {
            select = select.filter(StudentColumn::GradeId.eq(grade_id));
        }
        if let Some(student_id) = query.student_id {
            select = select.filter(Column::StudentId.eq(student_id));
        }
        if let Some(date) = query.date {
            select = select.filter(Column::AttendanceDate.eq(date));
        }
        if let Some(from_date) = query.from_date {
            select = select.filter(Column::AttendanceDate.gte(from_date));
        }
        if let Some(to_date) = query.to_date {
            select = select.filter(Column::AttendanceDate.lte(to_date));
        }
        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        select = select
            .order_by_desc(Column::AttendanceDate)
            .order_by_asc(StudentColumn::RollNumber);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询考勤总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询考勤页数失败: {e}")))?;

        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询考勤列表失败: {e}")))?;

        Ok(AttendanceListResponse {
            items: self.attach_details(rows).await?,
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    pub async fn update_attendance_status_impl(
        &self,
        id: i64,
        status: AttendanceStatus,
    ) -> Result<Option<AttendanceRecord>> {
        if Attendance::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询考勤记录失败: {e}")))?
            .is_none()
        {
            return Ok(None);
        }

        let model = ActiveModel {
            id: Set(id),
            status: Set(status.to_string()),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("更新考勤记录失败: {e}")))?;

        Ok(Some(updated.into_record()))
    }

    pub async fn delete_attendance_impl(&self, id: i64) -> Result<bool> {
        let result = Attendance::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("删除考勤记录失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 学生在闭区间内的考勤记录，日期升序
    pub async fn list_student_attendance_between_impl(
        &self,
        student_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let rows = Attendance::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::AttendanceDate.between(from, to))
            .order_by_asc(Column::AttendanceDate)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生考勤失败: {e}")))?;

        Ok(rows.into_iter().map(AttendanceModel::into_record).collect())
    }

    /// 年级在闭区间内的考勤记录，按日期升序、学号升序
    pub async fn list_grade_attendance_between_impl(
        &self,
        grade_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceDetail>> {
        let rows = Attendance::find()
            .find_also_related(Students)
            .filter(StudentColumn::GradeId.eq(grade_id))
            .filter(Column::AttendanceDate.between(from, to))
            .order_by_asc(Column::AttendanceDate)
            .order_by_asc(StudentColumn::RollNumber)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询年级考勤失败: {e}")))?;

        self.attach_details(rows).await
    }

    /// 补充学生所在年级名称与记录教师姓名
    async fn attach_details(
        &self,
        rows: Vec<(AttendanceModel, Option<StudentModel>)>,
    ) -> Result<Vec<AttendanceDetail>> {
        let mut grade_ids: Vec<i64> = rows
            .iter()
            .filter_map(|(_, student)| student.as_ref().map(|s| s.grade_id))
            .collect();
        grade_ids.sort_unstable();
        grade_ids.dedup();

        let mut teacher_ids: Vec<i64> = rows.iter().filter_map(|(a, _)| a.teacher_id).collect();
        teacher_ids.sort_unstable();
        teacher_ids.dedup();

        let grade_names: HashMap<i64, String> = if grade_ids.is_empty() {
            HashMap::new()
        } else {
            Grades::find()
                .filter(GradeColumn::Id.is_in(grade_ids))
                .all(&self.db)
                .await
                .map_err(|e| AttendanceError::database_operation(format!("查询年级失败: {e}")))?
                .into_iter()
                .map(|g| (g.id, g.name))
                .collect()
        };

        let teacher_names: HashMap<i64, String> = if teacher_ids.is_empty() {
            HashMap::new()
        } else {
            Users::find()
                .filter(UserColumn::Id.is_in(teacher_ids))
                .all(&self.db)
                .await
                .map_err(|e| AttendanceError::database_operation(format!("查询教师失败: {e}")))?
                .into_iter()
                .map(|u| {
                    let user: User = u.into_user();
                    (user.id, user.name_for_display().to_string())
                })
                .collect()
        };

        let details = rows
            .into_iter()
            .filter_map(|(attendance, student)| {
                // 外键保证学生存在，缺失时跳过
                let student = student?;
                let record = attendance.into_record();
                Some(AttendanceDetail {
                    teacher_name: record
                        .teacher_id
                        .and_then(|id| teacher_names.get(&id).cloned()),
                    grade_name: grade_names.get(&student.grade_id).cloned().unwrap_or_default(),
                    grade_id: student.grade_id,
                    student_name: student.name,
                    roll_number: student.roll_number,
                    record,
                })
            })
            .collect();

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::tests::{
        seed_grade, seed_student, seed_teacher, test_storage,
    };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn entry(student_id: i64, status: AttendanceStatus) -> AttendanceEntry {
        AttendanceEntry { student_id, status }
    }

    #[tokio::test]
    async fn test_second_sheet_for_same_day_conflicts() {
        let storage = test_storage().await;
        let grade = seed_grade(&storage, "Grade 5").await;
        let teacher = seed_teacher(&storage, "teacher05", grade.id).await;
        let a = seed_student(&storage, "Asha", "G5-001", grade.id).await;
        let b = seed_student(&storage, "Bilal", "G5-002", grade.id).await;

        let sheet = vec![
            entry(a.id, AttendanceStatus::Present),
            entry(b.id, AttendanceStatus::Absent),
        ];
        let records = storage
            .mark_attendance_impl(grade.id, day(3), teacher.id, sheet.clone())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(
            storage
                .attendance_exists_for_grade_on_impl(grade.id, day(3))
                .await
                .unwrap()
        );

        let err = storage
            .mark_attendance_impl(grade.id, day(3), teacher.id, sheet)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E011");

        // 其他日期不受影响
        assert!(
            !storage
                .attendance_exists_for_grade_on_impl(grade.id, day(4))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_sheet_checked_against_roster_inside_transaction() {
        let storage = test_storage().await;
        let grade = seed_grade(&storage, "Grade 6").await;
        let teacher = seed_teacher(&storage, "teacher06", grade.id).await;
        let a = seed_student(&storage, "Asha", "G6-001", grade.id).await;

        let err = storage
            .mark_attendance_impl(
                grade.id,
                day(5),
                teacher.id,
                vec![
                    entry(a.id, AttendanceStatus::Present),
                    entry(a.id, AttendanceStatus::Absent),
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E010");

        // 名单在提交时读取，新加入的学生必须出现在考勤表中
        seed_student(&storage, "Bilal", "G6-002", grade.id).await;
        let err = storage
            .mark_attendance_impl(
                grade.id,
                day(5),
                teacher.id,
                vec![entry(a.id, AttendanceStatus::Present)],
            )
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Attendance is missing for: G6-002");
        assert!(
            !storage
                .attendance_exists_for_grade_on_impl(grade.id, day(5))
                .await
                .unwrap()
        );

        let err = storage
            .mark_attendance_impl(grade.id + 1, day(5), teacher.id, vec![])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E010");
    }

    #[tokio::test]
    async fn test_range_queries_are_inclusive_and_ordered() {
        let storage = test_storage().await;
        let grade = seed_grade(&storage, "Grade 1").await;
        let teacher = seed_teacher(&storage, "teacher01", grade.id).await;
        let a = seed_student(&storage, "Zoya", "G1-002", grade.id).await;
        let b = seed_student(&storage, "Arjun", "G1-001", grade.id).await;

        for (d, status) in [
            (10, AttendanceStatus::Present),
            (12, AttendanceStatus::Absent),
            (11, AttendanceStatus::Present),
        ] {
            storage
                .mark_attendance_impl(
                    grade.id,
                    day(d),
                    teacher.id,
                    vec![entry(a.id, status), entry(b.id, AttendanceStatus::Present)],
                )
                .await
                .unwrap();
        }

        let records = storage
            .list_student_attendance_between_impl(a.id, day(10), day(11))
            .await
            .unwrap();
        let dates: Vec<_> = records.iter().map(|r| r.attendance_date).collect();
        assert_eq!(dates, vec![day(10), day(11)]);

        let details = storage
            .list_grade_attendance_between_impl(grade.id, day(11), day(12))
            .await
            .unwrap();
        assert_eq!(details.len(), 4);
        assert_eq!(details[0].record.attendance_date, day(11));
        assert_eq!(details[0].roll_number, "G1-001");
        assert_eq!(details[1].roll_number, "G1-002");
        assert_eq!(details[3].record.status, AttendanceStatus::Absent);
        assert_eq!(details[0].grade_name, "Grade 1");
        assert_eq!(details[0].teacher_name.as_deref(), Some("teacher01"));
    }

    #[tokio::test]
    async fn test_list_filters_and_newest_first() {
        let storage = test_storage().await;
        let grade = seed_grade(&storage, "Grade 2").await;
        let teacher = seed_teacher(&storage, "teacher02", grade.id).await;
        let a = seed_student(&storage, "Asha", "G2-001", grade.id).await;

        for d in [1, 2, 3] {
            let status = if d == 2 {
                AttendanceStatus::Absent
            } else {
                AttendanceStatus::Present
            };
            storage
                .mark_attendance_impl(grade.id, day(d), teacher.id, vec![entry(a.id, status)])
                .await
                .unwrap();
        }

        let all = storage
            .list_attendance_with_pagination_impl(AttendanceListQuery {
                grade_id: Some(grade.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 3);
        assert_eq!(all.items[0].record.attendance_date, day(3));

        let absent = storage
            .list_attendance_with_pagination_impl(AttendanceListQuery {
                status: Some(AttendanceStatus::Absent),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(absent.pagination.total, 1);
        assert_eq!(absent.items[0].record.attendance_date, day(2));

        let ranged = storage
            .list_attendance_with_pagination_impl(AttendanceListQuery {
                from_date: Some(day(2)),
                to_date: Some(day(3)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ranged.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_update_and_cascade_delete() {
        let storage = test_storage().await;
        let grade = seed_grade(&storage, "Grade 3").await;
        let teacher = seed_teacher(&storage, "teacher03", grade.id).await;
        let a = seed_student(&storage, "Asha", "G3-001", grade.id).await;

        let records = storage
            .mark_attendance_impl(
                grade.id,
                day(7),
                teacher.id,
                vec![entry(a.id, AttendanceStatus::Absent)],
            )
            .await
            .unwrap();
        let id = records[0].id;

        let updated = storage
            .update_attendance_status_impl(id, AttendanceStatus::Present)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, AttendanceStatus::Present);
        assert!(
            storage
                .update_attendance_status_impl(id + 100, AttendanceStatus::Present)
                .await
                .unwrap()
                .is_none()
        );

        assert!(storage.delete_student_impl(a.id).await.unwrap());
        assert!(storage.get_attendance_by_id_impl(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleted_teacher_leaves_record_unattributed() {
        let storage = test_storage().await;
        let grade = seed_grade(&storage, "Grade 4").await;
        let teacher = seed_teacher(&storage, "teacher04", grade.id).await;
        let a = seed_student(&storage, "Asha", "G4-001", grade.id).await;

        let records = storage
            .mark_attendance_impl(
                grade.id,
                day(8),
                teacher.id,
                vec![entry(a.id, AttendanceStatus::Present)],
            )
            .await
            .unwrap();

        assert!(storage.delete_user_impl(teacher.id).await.unwrap());
        let detail = storage
            .get_attendance_by_id_impl(records[0].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.record.teacher_id, None);
        assert_eq!(detail.teacher_name, None);
    }
}

use super::SeaOrmStorage;
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    PaginationInfo,
    users::{
        entities::{User, UserRole, UserStatus},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::utils::like_contains;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    /// 创建用户，`req.password` 必须已是哈希值
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        // 管理员不关联年级
        let grade_id = match req.role {
            UserRole::Teacher => req.grade_id,
            UserRole::Admin => None,
        };

        let model = ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            display_name: Set(req.display_name),
            grade_id: Set(grade_id),
            qualification: Set(req.qualification),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("创建用户失败: {e}")))?;

        Ok(result.into_user())
    }

    async fn find_user(&self, condition: Condition) -> Result<Option<User>> {
        Users::find()
            .filter(condition)
            .one(&self.db)
            .await
            .map(|found| found.map(|m| m.into_user()))
            .map_err(|e| AttendanceError::database_operation(format!("查询用户失败: {e}")))
    }

    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        self.find_user(Condition::all().add(Column::Id.eq(id))).await
    }

    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        self.find_user(Condition::all().add(Column::Username.eq(username)))
            .await
    }

    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        self.find_user(Condition::all().add(Column::Email.eq(email)))
            .await
    }

    /// 登录标识可以是用户名或邮箱
    pub async fn get_user_by_username_or_email_impl(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        self.find_user(
            Condition::any()
                .add(Column::Username.eq(identifier))
                .add(Column::Email.eq(identifier)),
        )
        .await
    }

    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Users::find();

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let search = search.trim();
            select = select.filter(
                Condition::any()
                    .add(Column::Username.like(like_contains(search)))
                    .add(Column::Email.like(like_contains(search)))
                    .add(Column::DisplayName.like(like_contains(search))),
            );
        }

        let filters = Condition::all()
            .add_option(query.role.map(|role| Column::Role.eq(role.to_string())))
            .add_option(query.status.map(|status| Column::Status.eq(status.to_string())))
            .add_option(query.grade_id.map(|grade_id| Column::GradeId.eq(grade_id)));
        select = select.filter(filters).order_by_asc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询用户总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询用户页数失败: {e}")))?;

        let users = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                AttendanceError::database_operation(format!("更新最后登录时间失败: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息，`update.password` 必须已是哈希值
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        let Some(existing) = self.get_user_by_id_impl(id).await? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(email) = update.email {
            model.email = Set(email);
        }

        if let Some(password) = update.password {
            model.password_hash = Set(password);
        }

        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }

        if let Some(display_name) = update.display_name {
            model.display_name = Set(Some(display_name));
        }

        if let Some(qualification) = update.qualification {
            model.qualification = Set(Some(qualification));
        }

        let role = update.role.unwrap_or(existing.role);
        match role {
            // 角色变为管理员时解除年级关联
            UserRole::Admin => model.grade_id = Set(None),
            UserRole::Teacher => {
                if let Some(grade_id) = update.grade_id {
                    model.grade_id = Set(Some(grade_id));
                }
            }
        }
        model.role = Set(role.to_string());

        model
            .update(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("更新用户失败: {e}")))?;

        self.get_user_by_id_impl(id).await
    }

    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("删除用户失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_users_impl(&self) -> Result<u64> {
        let count = Users::find()
            .count(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("统计用户数量失败: {e}")))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::tests::{seed_grade, test_storage};

    fn teacher_request(username: &str, grade_id: i64) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@school.test"),
            password: "hashed".to_string(),
            role: UserRole::Teacher,
            display_name: Some("Ms. Rao".to_string()),
            grade_id: Some(grade_id),
            qualification: Some("B.Ed".to_string()),
        }
    }

    #[tokio::test]
    async fn test_login_lookup_by_username_or_email() {
        let storage = test_storage().await;
        let grade = seed_grade(&storage, "Grade 5").await;
        storage
            .create_user_impl(teacher_request("teacher01", grade.id))
            .await
            .unwrap();

        let by_name = storage
            .get_user_by_username_or_email_impl("teacher01")
            .await
            .unwrap();
        let by_email = storage
            .get_user_by_username_or_email_impl("teacher01@school.test")
            .await
            .unwrap();
        assert_eq!(by_name.unwrap().id, by_email.unwrap().id);
        assert!(
            storage
                .get_user_by_username_or_email_impl("nobody")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_promote_to_admin_clears_grade() {
        let storage = test_storage().await;
        let grade = seed_grade(&storage, "Grade 6").await;
        let user = storage
            .create_user_impl(teacher_request("teacher02", grade.id))
            .await
            .unwrap();
        assert_eq!(user.grade_id, Some(grade.id));

        let updated = storage
            .update_user_impl(
                user.id,
                UpdateUserRequest {
                    email: None,
                    password: None,
                    role: Some(UserRole::Admin),
                    status: None,
                    display_name: None,
                    grade_id: None,
                    qualification: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.grade_id, None);
    }

    #[tokio::test]
    async fn test_list_users_filters_by_grade_and_search() {
        let storage = test_storage().await;
        let g1 = seed_grade(&storage, "Grade 1").await;
        let g2 = seed_grade(&storage, "Grade 2").await;
        storage
            .create_user_impl(teacher_request("alpha_t", g1.id))
            .await
            .unwrap();
        storage
            .create_user_impl(teacher_request("alphaxt", g2.id))
            .await
            .unwrap();

        let result = storage
            .list_users_with_pagination_impl(UserListQuery {
                grade_id: Some(g2.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.pagination.total, 1);
        assert_eq!(result.items[0].username, "alphaxt");

        // 下划线按字面匹配
        let result = storage
            .list_users_with_pagination_impl(UserListQuery {
                search: Some("a_t".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.pagination.total, 1);
        assert_eq!(result.items[0].username, "alpha_t");
    }
}

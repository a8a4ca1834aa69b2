//! PostgreSQL user repository.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppResult, DatabaseErrorConverter};
use crate::models::{UpdateUser, User};
use crate::repositories::{PageRequest, UserRepository};
use crate::schema::users;

/// User repository holding an async connection pool.
///
/// The pool is an `Arc` internally, so cloning the repository is cheap.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: AsyncDbPool,
}

impl PgUserRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "get user"))
    }

    async fn get_all(&self, page: Option<PageRequest>) -> AppResult<Vec<User>> {
        let mut conn = self.pool.get().await?;

        let mut query = users::table
            .select(User::as_select())
            .order(users::id.asc())
            .into_boxed();
        if let Some(page) = page {
            query = query.offset(page.offset()).limit(page.limit());
        }

        query
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list users"))
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(users::table)
                    .values(&user)
                    .returning(User::as_returning())
                    .get_result(conn)
                    .await
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "create user"))
    }

    async fn update(&self, user_id: Uuid, changes: UpdateUser) -> AppResult<Option<User>> {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::update(users::table.find(user_id))
                    .set(&changes)
                    .returning(User::as_returning())
                    .get_result(conn)
                    .await
                    .optional()
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "update user"))
    }

    async fn delete(&self, user_id: Uuid) -> AppResult<bool> {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let deleted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    diesel::delete(users::table.find(user_id))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "delete user"))?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::repositories::testing;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "pg@example.com".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            phone_number: Some("555-0100".to_string()),
            role_type: Some(1),
        }
    }

    fn changes() -> UpdateUser {
        UpdateUser {
            email: "bob@example.com".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Stone".to_string(),
            phone_number: None,
            role_type: None,
        }
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let Some(pool) = testing::pool().await else {
            return;
        };
        let repo = PgUserRepository::new(pool);

        let created = repo.create(user()).await.unwrap();
        assert_eq!(repo.get_by_id(created.id).await.unwrap(), Some(created.clone()));

        let updated = repo.update(created.id, changes()).await.unwrap().unwrap();
        assert_eq!(updated.email, "bob@example.com");
        assert_eq!(updated.phone_number, None);
        assert_eq!(updated.role_type, None);

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(repo.update(created.id, changes()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_leaves_first_row() {
        let Some(pool) = testing::pool().await else {
            return;
        };
        let repo = PgUserRepository::new(pool);
        let created = repo.create(user()).await.unwrap();

        let mut clash = user();
        clash.id = created.id;
        clash.email = "clash@example.com".to_string();
        let err = repo.create(clash).await.unwrap_err();

        assert!(matches!(err, AppError::Database { .. }));
        assert_eq!(repo.get_by_id(created.id).await.unwrap(), Some(created.clone()));
        repo.delete(created.id).await.unwrap();
    }
}

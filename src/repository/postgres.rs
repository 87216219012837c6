//! PostgreSQL user repository: plain parameterized SQL, no query builder.

use async_trait::async_trait;
use sqlx::PgPool;

use super::UserRepository;
use crate::error::Result;
use crate::user::User;

/// User repository over a PostgreSQL connection pool.
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Creates a repository over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, mut user: User) -> Result<User> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.pool)
        .await?;

        user.id = id;
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_by_name(&self, name: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update(&self, user: User) -> Result<i64> {
        // Empty fields mean "no change"; NULLIF folds them away so a single
        // parameterized statement covers every partial update.
        let result = sqlx::query(
            "UPDATE users SET \
                 name = COALESCE(NULLIF($2, ''), name), \
                 email = COALESCE(NULLIF($3, ''), email), \
                 password = COALESCE(NULLIF($4, ''), password) \
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .execute(&self.pool)
        .await?;

        Ok(i64::try_from(result.rows_affected()).unwrap_or(i64::MAX))
    }

    async fn remove(&self, id: i64) -> Result<i64> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(i64::try_from(result.rows_affected()).unwrap_or(i64::MAX))
    }
}

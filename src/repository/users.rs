//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{Capability, RegisterRequest, User, UserPublic},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username (primary authentication method)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Check if username already exists
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// List all users for the dashboard, in insertion order
    pub async fn list(&self) -> AppResult<Vec<UserPublic>> {
        let users = sqlx::query_as::<_, UserPublic>(
            "SELECT id, username, first_name, last_name FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Create a user with a pre-hashed password
    pub async fn create(&self, user: &RegisterRequest, password_hash: &str) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.email.as_deref().unwrap_or(""))
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Capability grants for a user
    pub async fn get_capabilities(&self, user_id: i32) -> AppResult<Vec<Capability>> {
        let capabilities = sqlx::query_scalar::<_, Capability>(
            "SELECT capability FROM user_capabilities WHERE user_id = $1 ORDER BY capability",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(capabilities)
    }
}

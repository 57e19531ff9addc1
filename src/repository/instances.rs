//! Book instances repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{
        BookInstance, CreateBookInstance, LoanRow, LoanStatus, UpdateBookInstance,
    },
};

#[derive(Clone)]
pub struct InstancesRepository {
    pool: Pool<Postgres>,
}

impl InstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Count all copies
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count copies currently available
    pub async fn count_available(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
                .bind(LoanStatus::Available)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count copies of one book
    pub async fn count_by_book(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE book_id = $1")
                .bind(book_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Get a copy by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Get a copy with its book title and borrower username
    pub async fn get_with_book(&self, id: Uuid) -> AppResult<LoanRow> {
        sqlx::query_as::<_, LoanRow>(
            r#"
            SELECT bi.id, bi.book_id, b.title, bi.imprint, bi.due_back, bi.status,
                   bi.borrower_id, u.username AS borrower
            FROM book_instances bi
            JOIN books b ON bi.book_id = b.id
            LEFT JOIN users u ON bi.borrower_id = u.id
            WHERE bi.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Count a user's copies currently on loan
    pub async fn count_loans_by_user(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE status = $1 AND borrower_id = $2",
        )
        .bind(LoanStatus::OnLoan)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// List one page of a user's on-loan copies, soonest due first
    pub async fn list_loans_by_user(
        &self,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<LoanRow>> {
        let loans = sqlx::query_as::<_, LoanRow>(
            r#"
            SELECT bi.id, bi.book_id, b.title, bi.imprint, bi.due_back, bi.status,
                   bi.borrower_id, u.username AS borrower
            FROM book_instances bi
            JOIN books b ON bi.book_id = b.id
            LEFT JOIN users u ON bi.borrower_id = u.id
            WHERE bi.status = $1 AND bi.borrower_id = $2
            ORDER BY bi.due_back, bi.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Count all copies currently on loan
    pub async fn count_loans(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
                .bind(LoanStatus::OnLoan)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// List one page of all on-loan copies, soonest due first
    pub async fn list_loans(&self, limit: i64, offset: i64) -> AppResult<Vec<LoanRow>> {
        let loans = sqlx::query_as::<_, LoanRow>(
            r#"
            SELECT bi.id, bi.book_id, b.title, bi.imprint, bi.due_back, bi.status,
                   bi.borrower_id, u.username AS borrower
            FROM book_instances bi
            JOIN books b ON bi.book_id = b.id
            LEFT JOIN users u ON bi.borrower_id = u.id
            WHERE bi.status = $1
            ORDER BY bi.due_back, bi.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Create a new copy
    pub async fn create(&self, id: Uuid, instance: &CreateBookInstance) -> AppResult<BookInstance> {
        self.check_references(instance.book_id, instance.borrower_id)
            .await?;

        let created = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, status, borrower_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(instance.book_id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.status)
        .bind(instance.borrower_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a copy, replacing every field. This is the generic transition
    /// hook for check-out and return flows.
    pub async fn update(&self, id: Uuid, instance: &UpdateBookInstance) -> AppResult<BookInstance> {
        self.check_references(instance.book_id, instance.borrower_id)
            .await?;

        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET book_id = $1, imprint = $2, due_back = $3, status = $4, borrower_id = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(instance.book_id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.status)
        .bind(instance.borrower_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Delete a copy
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }

        Ok(())
    }

    /// Set a validated new due date.
    ///
    /// The row is locked for the duration of the transaction so two renewals
    /// arriving together serialize instead of losing an update.
    pub async fn renew(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        let mut tx = self.pool.begin().await?;

        let instance = sqlx::query_as::<_, BookInstance>(
            "SELECT * FROM book_instances WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))?;

        let renewed = sqlx::query_as::<_, BookInstance>(
            "UPDATE book_instances SET due_back = $1 WHERE id = $2 RETURNING *",
        )
        .bind(due_back)
        .bind(instance.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(renewed)
    }

    /// Mark a copy returned: available again, no borrower, no due date
    pub async fn mark_returned(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET status = $1, due_back = NULL, borrower_id = NULL
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(LoanStatus::Available)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Verify the referenced book and borrower exist
    async fn check_references(&self, book_id: i32, borrower_id: Option<i32>) -> AppResult<()> {
        let book_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                .bind(book_id)
                .fetch_one(&self.pool)
                .await?;
        if !book_exists {
            return Err(AppError::NotFound(format!(
                "Book with id {} not found",
                book_id
            )));
        }

        if let Some(borrower_id) = borrower_id {
            let borrower_exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                    .bind(borrower_id)
                    .fetch_one(&self.pool)
                    .await?;
            if !borrower_exists {
                return Err(AppError::NotFound(format!(
                    "User with id {} not found",
                    borrower_id
                )));
            }
        }

        Ok(())
    }
}

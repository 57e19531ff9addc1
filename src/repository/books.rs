//! Books repository for database operations (books, genres, languages)

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::Author,
        book::{
            display_genre, Book, BookDetail, BookSummary, CreateBook, CreateGenre,
            CreateLanguage, Genre, Language, UpdateBook,
        },
        book_instance::BookInstance,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Count all books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count books whose title contains the fragment (case-insensitive)
    pub async fn count_title_containing(&self, fragment: &str) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE title ILIKE '%' || $1 || '%'")
                .bind(fragment)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// List one page of books in insertion order, with the author display name
    pub async fn list_page(&self, limit: i64, offset: i64) -> AppResult<Vec<BookSummary>> {
        let books = sqlx::query_as::<_, BookSummary>(
            r#"
            SELECT b.id, b.title, a.last_name || ', ' || a.first_name AS author
            FROM books b
            LEFT JOIN authors a ON b.author_id = a.id
            ORDER BY b.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// List all books attributed to an author
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>> {
        let books = sqlx::query_as::<_, BookSummary>(
            r#"
            SELECT b.id, b.title, a.last_name || ', ' || a.first_name AS author
            FROM books b
            LEFT JOIN authors a ON b.author_id = a.id
            WHERE b.author_id = $1
            ORDER BY b.id
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book detail with author, language, genres and copies
    pub async fn get_detail(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => {
                sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
                    .bind(author_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let language = match book.language_id {
            Some(language_id) => {
                sqlx::query_as::<_, Language>("SELECT * FROM languages WHERE id = $1")
                    .bind(language_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.id
            WHERE bg.book_id = $1
            ORDER BY g.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let instances = sqlx::query_as::<_, BookInstance>(
            "SELECT * FROM book_instances WHERE book_id = $1 ORDER BY due_back, id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let genre_display = display_genre(&genres);

        Ok(BookDetail {
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author,
            language,
            genres,
            genre_display,
            instances,
        })
    }

    /// Create a new book with its genre links
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let genre_ids = self
            .check_references(book.author_id, book.language_id, &book.genre_ids)
            .await?;
        self.check_isbn_free(&book.isbn, None).await?;

        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.language_id)
        .fetch_one(&mut *tx)
        .await?;

        for genre_id in &genre_ids {
            sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
                .bind(created.id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(created)
    }

    /// Update a book, replacing every field including its genre set
    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        let genre_ids = self
            .check_references(book.author_id, book.language_id, &book.genre_ids)
            .await?;
        self.check_isbn_free(&book.isbn, Some(id)).await?;

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author_id = $2, summary = $3, isbn = $4, language_id = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.language_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for genre_id in &genre_ids {
            sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a book
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    /// Verify referenced author, language and genres exist.
    /// Returns the genre ids deduplicated.
    async fn check_references(
        &self,
        author_id: Option<i32>,
        language_id: Option<i32>,
        genre_ids: &[i32],
    ) -> AppResult<Vec<i32>> {
        if let Some(author_id) = author_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE id = $1)")
                    .bind(author_id)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(AppError::NotFound(format!(
                    "Author with id {} not found",
                    author_id
                )));
            }
        }

        if let Some(language_id) = language_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM languages WHERE id = $1)")
                    .bind(language_id)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(AppError::NotFound(format!(
                    "Language with id {} not found",
                    language_id
                )));
            }
        }

        let mut genre_ids = genre_ids.to_vec();
        genre_ids.sort_unstable();
        genre_ids.dedup();

        if !genre_ids.is_empty() {
            let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres WHERE id = ANY($1)")
                .bind(&genre_ids)
                .fetch_one(&self.pool)
                .await?;
            if found != genre_ids.len() as i64 {
                return Err(AppError::NotFound("One or more genres not found".to_string()));
            }
        }

        Ok(genre_ids)
    }

    /// Reject an ISBN already used by another book
    async fn check_isbn_free(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<()> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND id != COALESCE($2, -1))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        if taken {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                isbn
            )));
        }

        Ok(())
    }

    // Genres

    /// Count all genres
    pub async fn count_genres(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// List all genres alphabetically
    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT * FROM genres ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    /// Create a genre; names are unique case-insensitively
    pub async fn create_genre(&self, genre: &CreateGenre) -> AppResult<Genre> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM genres WHERE LOWER(name) = LOWER($1))",
        )
        .bind(&genre.name)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            return Err(AppError::Conflict(format!(
                "Genre '{}' already exists",
                genre.name
            )));
        }

        let created =
            sqlx::query_as::<_, Genre>("INSERT INTO genres (name) VALUES ($1) RETURNING *")
                .bind(&genre.name)
                .fetch_one(&self.pool)
                .await?;

        Ok(created)
    }

    // Languages

    /// List all languages alphabetically
    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        let languages = sqlx::query_as::<_, Language>("SELECT * FROM languages ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(languages)
    }

    /// Create a language; names are unique case-insensitively
    pub async fn create_language(&self, language: &CreateLanguage) -> AppResult<Language> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM languages WHERE LOWER(name) = LOWER($1))",
        )
        .bind(&language.name)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            return Err(AppError::Conflict(format!(
                "Language '{}' already exists",
                language.name
            )));
        }

        let created = sqlx::query_as::<_, Language>(
            "INSERT INTO languages (name) VALUES ($1) RETURNING *",
        )
        .bind(&language.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}

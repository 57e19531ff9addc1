//! Catalog management service (authors, books, genres, languages, summary)

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetail, CreateAuthor, UpdateAuthor},
        book::{
            Book, BookDetail, BookSummary, CreateBook, CreateGenre, CreateLanguage, Genre,
            Language, UpdateBook,
        },
        pagination::{resolve_page, Paginated},
        summary::LibrarySummary,
    },
    repository::Repository,
};

/// Page size for author and book listings
pub const CATALOG_PAGE_SIZE: i64 = 5;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Entity counts for the home page. The visit count is request-scoped
    /// state owned by the caller, passed through untouched.
    pub async fn summary(&self, num_visits: i64) -> AppResult<LibrarySummary> {
        Ok(LibrarySummary {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.instances.count().await?,
            num_instances_available: self.repository.instances.count_available().await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.books.count_genres().await?,
            num_books_with_a: self.repository.books.count_title_containing("a").await?,
            num_visits,
        })
    }

    // Authors

    /// One page of authors in insertion order
    pub async fn list_authors(&self, page: i64) -> AppResult<Paginated<Author>> {
        let total = self.repository.authors.count().await?;
        let page = resolve_page(page, CATALOG_PAGE_SIZE, total)?;

        let items = self
            .repository
            .authors
            .list_page(page.per_page, page.offset)
            .await?;

        Ok(Paginated::new(items, &page))
    }

    /// Author detail with the books attributed to them
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;

        Ok(AuthorDetail {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
            books,
        })
    }

    /// Create a new author
    pub async fn create_author(&self, request: &CreateAuthor) -> AppResult<Author> {
        self.repository.authors.create(request).await
    }

    /// Update an author
    pub async fn update_author(&self, id: i32, request: &UpdateAuthor) -> AppResult<Author> {
        self.repository.authors.update(id, request).await
    }

    /// Delete an author. Refused while books still reference them.
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        let books = self.repository.authors.count_books(id).await?;
        if books > 0 {
            return Err(AppError::Conflict(format!(
                "Author {} cannot be deleted: {} book(s) attached",
                id, books
            )));
        }

        self.repository.authors.delete(id).await
    }

    // Books

    /// One page of books in insertion order
    pub async fn list_books(&self, page: i64) -> AppResult<Paginated<BookSummary>> {
        let total = self.repository.books.count().await?;
        let page = resolve_page(page, CATALOG_PAGE_SIZE, total)?;

        let items = self
            .repository
            .books
            .list_page(page.per_page, page.offset)
            .await?;

        Ok(Paginated::new(items, &page))
    }

    /// Book detail with author, language, genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        self.repository.books.get_detail(id).await
    }

    /// Create a new book
    pub async fn create_book(&self, request: &CreateBook) -> AppResult<Book> {
        self.repository.books.create(request).await
    }

    /// Update a book
    pub async fn update_book(&self, id: i32, request: &UpdateBook) -> AppResult<Book> {
        self.repository.books.update(id, request).await
    }

    /// Delete a book. Refused while copies of it still exist.
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        let instances = self.repository.instances.count_by_book(id).await?;
        if instances > 0 {
            return Err(AppError::Conflict(format!(
                "Book {} cannot be deleted: {} instance(s) attached",
                id, instances
            )));
        }

        self.repository.books.delete(id).await
    }

    // Genres and languages

    /// List all genres
    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.books.list_genres().await
    }

    /// Create a genre
    pub async fn create_genre(&self, request: &CreateGenre) -> AppResult<Genre> {
        self.repository.books.create_genre(request).await
    }

    /// List all languages
    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.books.list_languages().await
    }

    /// Create a language
    pub async fn create_language(&self, request: &CreateLanguage) -> AppResult<Language> {
        self.repository.books.create_language(request).await
    }
}

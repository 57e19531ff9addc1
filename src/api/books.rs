//! Book, genre and language endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{
            Book, BookDetail, BookSummary, CreateBook, CreateGenre, CreateLanguage, Genre,
            Language, UpdateBook,
        },
        pagination::{PageQuery, Paginated},
    },
};

use super::AuthenticatedUser;

/// List books, 5 per page, in insertion order
#[utoipa::path(
    get,
    path = "/catalog/books",
    tag = "books",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = Paginated<BookSummary>),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<BookSummary>>> {
    let page = state.services.catalog.list_books(query.page()).await?;
    Ok(Json(page))
}

/// Get book details with author, genres, language and copies
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/catalog/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Referenced author, language or genre not found"),
        (status = 409, description = "ISBN already in use")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_edit_book()?;
    request.validate()?;

    let book = state.services.catalog.create_book(&request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a book, replacing every field including its genre set
#[utoipa::path(
    put,
    path = "/catalog/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "ISBN already in use")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    claims.require_edit_book()?;
    request.validate()?;

    let book = state.services.catalog.update_book(id, &request).await?;
    Ok(Json(book))
}

/// Delete a book. Refused while copies of it still exist.
#[utoipa::path(
    delete,
    path = "/catalog/book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book still has copies")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_delete_book()?;

    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List all genres
#[utoipa::path(
    get,
    path = "/catalog/genres",
    tag = "books",
    responses(
        (status = 200, description = "All genres, alphabetically", body = Vec<Genre>)
    )
)]
pub async fn list_genres(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.services.catalog.list_genres().await?;
    Ok(Json(genres))
}

/// Create a genre
#[utoipa::path(
    post,
    path = "/catalog/genres",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateGenre,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 403, description = "Missing capability"),
        (status = 409, description = "Genre name already exists")
    )
)]
pub async fn create_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateGenre>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    claims.require_edit_book()?;
    request.validate()?;

    let genre = state.services.catalog.create_genre(&request).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// List all languages
#[utoipa::path(
    get,
    path = "/catalog/languages",
    tag = "books",
    responses(
        (status = 200, description = "All languages, alphabetically", body = Vec<Language>)
    )
)]
pub async fn list_languages(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Language>>> {
    let languages = state.services.catalog.list_languages().await?;
    Ok(Json(languages))
}

/// Create a language
#[utoipa::path(
    post,
    path = "/catalog/languages",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateLanguage,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 403, description = "Missing capability"),
        (status = 409, description = "Language name already exists")
    )
)]
pub async fn create_language(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLanguage>,
) -> AppResult<(StatusCode, Json<Language>)> {
    claims.require_edit_book()?;
    request.validate()?;

    let language = state.services.catalog.create_language(&request).await?;
    Ok((StatusCode::CREATED, Json(language)))
}

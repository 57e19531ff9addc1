//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, health, loans, summary, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LocalLibrary API",
        version = "1.0.0",
        description = "Library Catalog REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        // Catalog summary
        summary::library_summary,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::list_genres,
        books::create_genre,
        books::list_languages,
        books::create_language,
        // Loans
        loans::my_loans,
        loans::all_loans,
        loans::renewal_form,
        loans::renew_book,
        loans::return_book,
        // Book instances
        loans::get_instance,
        loans::create_instance,
        loans::update_instance,
        loans::delete_instance,
        // Users
        users::register,
        users::login,
        users::dashboard,
    ),
    components(
        schemas(
            // Authors
            crate::models::author::Author,
            crate::models::author::AuthorDetail,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookDetail,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::Genre,
            crate::models::book::CreateGenre,
            crate::models::book::Language,
            crate::models::book::CreateLanguage,
            // Book instances and loans
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::LoanEntry,
            crate::models::book_instance::RenewBookRequest,
            crate::models::book_instance::RenewalForm,
            crate::models::book_instance::CreateBookInstance,
            crate::models::book_instance::UpdateBookInstance,
            // Users
            crate::models::user::User,
            crate::models::user::UserPublic,
            crate::models::user::Capability,
            crate::models::user::RegisterRequest,
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            // Summary
            crate::models::summary::LibrarySummary,
            // Errors
            crate::error::ErrorResponse,
            // Health
            health::HealthResponse,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "catalog", description = "Library summary"),
        (name = "authors", description = "Author catalog"),
        (name = "books", description = "Book, genre and language catalog"),
        (name = "instances", description = "Book copies"),
        (name = "loans", description = "Borrowed books and renewals"),
        (name = "users", description = "Registration, login and dashboard")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router with Swagger UI
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

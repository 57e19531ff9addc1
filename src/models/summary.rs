//! Library summary model

use serde::Serialize;
use utoipa::ToSchema;

/// Entity counts for the library home page, plus the caller's visit count
#[derive(Debug, Serialize, ToSchema)]
pub struct LibrarySummary {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies currently available for borrowing
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    /// Books whose title contains the letter "a" (case-insensitive)
    pub num_books_with_a: i64,
    /// Times this client had visited the page before this request
    pub num_visits: i64,
}

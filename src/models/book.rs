//! Book, genre and language models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Number of genre names shown in the compact genre label
pub const GENRE_DISPLAY_LIMIT: usize = 3;

/// Book genre (e.g. Science Fiction)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Natural language a book is written in
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    pub isbn: String,
    pub language_id: Option<i32>,
}

/// Compact book row for listings and author details
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    /// Author display name ("Lastname, Firstname"), if the book has one
    pub author: Option<String>,
}

/// Book detail with resolved relations and per-copy availability
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<super::author::Author>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    /// Compact comma-separated genre label (first three genres)
    pub genre_display: String,
    pub instances: Vec<super::book_instance::BookInstance>,
}

/// Join the first few genre names into a single comma-separated label.
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(GENRE_DISPLAY_LIMIT)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub author_id: Option<i32>,
    /// Enter a brief description of the book
    #[validate(length(min = 1, max = 1000, message = "Summary must be 1-1000 characters"))]
    pub summary: String,
    /// 13 Character ISBN number
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1-13 characters"))]
    pub isbn: String,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    pub language_id: Option<i32>,
}

/// Update book request. Replaces every field, including the genre set.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub author_id: Option<i32>,
    #[validate(length(min = 1, max = 1000, message = "Summary must be 1-1000 characters"))]
    pub summary: String,
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1-13 characters"))]
    pub isbn: String,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    pub language_id: Option<i32>,
}

/// Create genre request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGenre {
    /// Enter a book genre (e.g. Science Fiction)
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

/// Create language request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLanguage {
    /// Enter the book's natural language (e.g. English, French, Japanese etc.)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_display_genre_caps_at_three() {
        let genres = vec![
            genre(1, "Fantasy"),
            genre(2, "Science Fiction"),
            genre(3, "Poetry"),
            genre(4, "Drama"),
        ];
        assert_eq!(display_genre(&genres), "Fantasy, Science Fiction, Poetry");
    }

    #[test]
    fn test_display_genre_empty() {
        assert_eq!(display_genre(&[]), "");
    }

    #[test]
    fn test_display_genre_single() {
        assert_eq!(display_genre(&[genre(1, "Fantasy")]), "Fantasy");
    }
}

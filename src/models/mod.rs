//! Data models for LocalLibrary

pub mod author;
pub mod book;
pub mod book_instance;
pub mod pagination;
pub mod summary;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookSummary, Genre, Language};
pub use book_instance::{BookInstance, LoanEntry, LoanStatus};
pub use pagination::Paginated;
pub use summary::LibrarySummary;
pub use user::{Capability, User, UserClaims};

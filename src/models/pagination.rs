//! Page-numbered listing support

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Listing query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number, 1-based (defaults to 1)
    pub page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }
}

/// Resolved position of one page within a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub per_page: i64,
    pub total: i64,
    pub num_pages: i64,
    pub offset: i64,
}

/// Validate a requested page number against the result-set size.
///
/// An empty result set still has one (empty) page; any page past the end
/// is a not-found outcome.
pub fn resolve_page(page: i64, per_page: i64, total: i64) -> AppResult<Page> {
    if page < 1 {
        return Err(AppError::NotFound(format!(
            "Invalid page ({}): That page number is less than 1",
            page
        )));
    }

    let num_pages = ((total + per_page - 1) / per_page).max(1);
    if page > num_pages {
        return Err(AppError::NotFound(format!(
            "Invalid page ({}): That page contains no results",
            page
        )));
    }

    Ok(Page {
        number: page,
        per_page,
        total,
        num_pages,
        offset: (page - 1) * per_page,
    })
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub num_pages: i64,
    pub is_paginated: bool,
}

impl<T> Paginated<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, page: &Page) -> Self {
        Paginated {
            items,
            total: page.total,
            page: page.number,
            per_page: page.per_page,
            num_pages: page.num_pages,
            is_paginated: page.num_pages > 1,
        }
    }
}

//! Loan listing, renewal and book-copy endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book_instance::{
            BookInstance, CreateBookInstance, LoanEntry, RenewBookRequest, RenewalForm,
            UpdateBookInstance,
        },
        pagination::{PageQuery, Paginated},
    },
};

use super::AuthenticatedUser;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// List the caller's borrowed books, soonest due first, 3 per page
#[utoipa::path(
    get,
    path = "/catalog/mybooks",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "One page of the caller's loans", body = Paginated<LoanEntry>),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<LoanEntry>>> {
    // Scoped to self; authentication is the only requirement.
    let page = state
        .services
        .loans
        .list_my_loans(claims.user_id, query.page(), today())
        .await?;
    Ok(Json(page))
}

/// List every borrowed book, soonest due first, 5 per page
#[utoipa::path(
    get,
    path = "/catalog/allborrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "One page of all active loans", body = Paginated<LoanEntry>),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn all_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<LoanEntry>>> {
    claims.require_mark_returned()?;

    let page = state
        .services
        .loans
        .list_all_loans(query.page(), today())
        .await?;
    Ok(Json(page))
}

/// Renewal form data for one copy, with the default proposed date
/// (three weeks from today)
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Renewal form data", body = RenewalForm),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renewal_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(instance_id): Path<Uuid>,
) -> AppResult<Json<RenewalForm>> {
    claims.require_mark_returned()?;

    let form = state
        .services
        .loans
        .renewal_form(instance_id, today())
        .await?;
    Ok(Json(form))
}

/// Renew a loan: validate the proposed due date and apply it.
///
/// Success redirects to the all-borrowed listing; a date outside the
/// window comes back as a field error and leaves the record untouched.
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewBookRequest,
    responses(
        (status = 303, description = "Renewed; redirect to the all-borrowed listing"),
        (status = 400, description = "Renewal date outside the allowed window"),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(instance_id): Path<Uuid>,
    Json(request): Json<RenewBookRequest>,
) -> AppResult<Redirect> {
    claims.require_mark_returned()?;

    state
        .services
        .loans
        .renew(instance_id, request.renewal_date, today())
        .await?;

    Ok(Redirect::to("/catalog/allborrowed"))
}

/// Mark a copy returned: available again, no borrower, no due date
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy marked returned", body = BookInstance),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    claims.require_mark_returned()?;

    let instance = state.services.loans.mark_returned(id).await?;
    Ok(Json(instance))
}

/// Get one copy with its book title, borrower and overdue flag
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}",
    tag = "instances",
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy details", body = LoanEntry),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_instance(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LoanEntry>> {
    let instance = state.services.loans.get_instance(id, today()).await?;
    Ok(Json(instance))
}

/// Create a new copy of a book
#[utoipa::path(
    post,
    path = "/catalog/bookinstances",
    tag = "instances",
    security(("bearer_auth" = [])),
    request_body = CreateBookInstance,
    responses(
        (status = 201, description = "Copy created", body = BookInstance),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Referenced book or borrower not found")
    )
)]
pub async fn create_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBookInstance>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    claims.require_edit_book()?;
    request.validate()?;

    let instance = state.services.loans.create_instance(&request).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Update a copy, replacing every field. This is the generic hook for
/// check-out and return status transitions.
#[utoipa::path(
    put,
    path = "/catalog/bookinstance/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = UpdateBookInstance,
    responses(
        (status = 200, description = "Copy updated", body = BookInstance),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn update_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookInstance>,
) -> AppResult<Json<BookInstance>> {
    claims.require_edit_book()?;
    request.validate()?;

    let instance = state.services.loans.update_instance(id, &request).await?;
    Ok(Json(instance))
}

/// Delete a copy
#[utoipa::path(
    delete,
    path = "/catalog/bookinstance/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn delete_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_delete_book()?;

    state.services.loans.delete_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

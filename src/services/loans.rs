//! Loan listing and renewal service

use chrono::{Duration, NaiveDate};
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{
            BookInstance, CreateBookInstance, LoanEntry, RenewalForm, UpdateBookInstance,
            RENEWAL_DATE_HELP_TEXT, RENEWAL_DATE_LABEL,
        },
        pagination::{resolve_page, Paginated},
    },
    repository::Repository,
};

/// Renewals may push the due date at most four weeks out
pub const RENEWAL_WINDOW_DAYS: i64 = 28;

/// Proposed renewal date when initiating a renewal
pub const RENEWAL_DEFAULT_DAYS: i64 = 21;

/// Page size for the caller's own loans
pub const MY_LOANS_PAGE_SIZE: i64 = 3;

/// Page size for the all-borrowed listing
pub const ALL_LOANS_PAGE_SIZE: i64 = 5;

/// A proposed renewal date outside the allowed window
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenewalDateError {
    #[error("Invalid date - renewal in the past.")]
    InPast,
    #[error("Invalid date - renewal date must be less than 4 weeks")]
    TooFarAhead,
}

impl From<RenewalDateError> for AppError {
    fn from(err: RenewalDateError) -> Self {
        let code = match err {
            RenewalDateError::InPast => "renewal_in_past",
            RenewalDateError::TooFarAhead => "renewal_too_far_ahead",
        };
        let mut field_error = ValidationError::new(code);
        field_error.message = Some(err.to_string().into());

        let mut errors = ValidationErrors::new();
        errors.add("renewal_date", field_error);
        AppError::InvalidFields(errors)
    }
}

/// Validate a proposed due date: allowed iff `today <= proposed <= today + 4 weeks`
/// (inclusive at both ends).
pub fn validate_renewal_date(
    proposed: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalDateError> {
    if proposed < today {
        return Err(RenewalDateError::InPast);
    }
    if proposed > today + Duration::days(RENEWAL_WINDOW_DAYS) {
        return Err(RenewalDateError::TooFarAhead);
    }
    Ok(proposed)
}

/// Proposed due date when initiating a renewal: three weeks from today
pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::days(RENEWAL_DEFAULT_DAYS)
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// One page of the caller's on-loan copies, soonest due first
    pub async fn list_my_loans(
        &self,
        user_id: i32,
        page: i64,
        today: NaiveDate,
    ) -> AppResult<Paginated<LoanEntry>> {
        let total = self
            .repository
            .instances
            .count_loans_by_user(user_id)
            .await?;
        let page = resolve_page(page, MY_LOANS_PAGE_SIZE, total)?;

        let rows = self
            .repository
            .instances
            .list_loans_by_user(user_id, page.per_page, page.offset)
            .await?;
        let items = rows
            .into_iter()
            .map(|row| LoanEntry::from_row(row, today))
            .collect();

        Ok(Paginated::new(items, &page))
    }

    /// One page of every on-loan copy, soonest due first
    pub async fn list_all_loans(
        &self,
        page: i64,
        today: NaiveDate,
    ) -> AppResult<Paginated<LoanEntry>> {
        let total = self.repository.instances.count_loans().await?;
        let page = resolve_page(page, ALL_LOANS_PAGE_SIZE, total)?;

        let rows = self
            .repository
            .instances
            .list_loans(page.per_page, page.offset)
            .await?;
        let items = rows
            .into_iter()
            .map(|row| LoanEntry::from_row(row, today))
            .collect();

        Ok(Paginated::new(items, &page))
    }

    /// Renewal form data for one copy, with the default proposed date
    pub async fn renewal_form(&self, instance_id: Uuid, today: NaiveDate) -> AppResult<RenewalForm> {
        let row = self.repository.instances.get_with_book(instance_id).await?;

        Ok(RenewalForm {
            instance_id: row.id,
            book_title: row.title,
            borrower: row.borrower,
            due_back: row.due_back,
            label: RENEWAL_DATE_LABEL.to_string(),
            help_text: RENEWAL_DATE_HELP_TEXT.to_string(),
            renewal_date: default_renewal_date(today),
        })
    }

    /// Validate a proposed due date and apply it.
    ///
    /// An unknown copy is reported before the date is judged; a rejected date
    /// leaves the record untouched. Renewal never changes the status.
    pub async fn renew(
        &self,
        instance_id: Uuid,
        proposed: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<BookInstance> {
        self.repository.instances.get_by_id(instance_id).await?;

        let renewal_date = validate_renewal_date(proposed, today)?;

        self.repository
            .instances
            .renew(instance_id, renewal_date)
            .await
    }

    /// Mark a copy returned
    pub async fn mark_returned(&self, instance_id: Uuid) -> AppResult<BookInstance> {
        self.repository.instances.mark_returned(instance_id).await
    }

    /// Copy detail with its book title, borrower and overdue flag
    pub async fn get_instance(&self, instance_id: Uuid, today: NaiveDate) -> AppResult<LoanEntry> {
        let row = self.repository.instances.get_with_book(instance_id).await?;
        Ok(LoanEntry::from_row(row, today))
    }

    /// Create a copy with a fresh UUID
    pub async fn create_instance(&self, request: &CreateBookInstance) -> AppResult<BookInstance> {
        let id = Uuid::new_v4();
        self.repository.instances.create(id, request).await
    }

    /// Update a copy (the generic status-transition hook)
    pub async fn update_instance(
        &self,
        id: Uuid,
        request: &UpdateBookInstance,
    ) -> AppResult<BookInstance> {
        self.repository.instances.update(id, request).await
    }

    /// Delete a copy
    pub async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.instances.delete(id).await
    }
}

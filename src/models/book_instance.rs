//! Book instance (loanable copy) model and loan status

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Form label for the proposed due date
pub const RENEWAL_DATE_LABEL: &str = "New due date";

/// Help text shown with the renewal date field
pub const RENEWAL_DATE_HELP_TEXT: &str = "Enter a date between now and 4 weeks (default is 3).";

/// Loan status of a single copy, stored as a one-character code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    /// One-character storage code
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.code().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Full book instance model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

/// Overdue rule: a due date is set and today is strictly past it,
/// regardless of status.
fn past_due(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    due_back.map(|due| today > due).unwrap_or(false)
}

impl BookInstance {
    /// A copy is overdue once today is strictly past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        past_due(self.due_back, today)
    }
}

/// Internal row structure for loan listing queries
#[derive(Debug, Clone, FromRow)]
pub struct LoanRow {
    pub id: Uuid,
    pub book_id: i32,
    pub title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
    pub borrower: Option<String>,
}

/// Loan listing entry: one on-loan copy with its book title and borrower
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanEntry {
    pub id: Uuid,
    pub book_id: i32,
    pub title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
    /// Borrower username, when the copy is checked out
    pub borrower: Option<String>,
    pub is_overdue: bool,
}

impl LoanEntry {
    pub fn from_row(row: LoanRow, today: NaiveDate) -> Self {
        let is_overdue = past_due(row.due_back, today);
        LoanEntry {
            id: row.id,
            book_id: row.book_id,
            title: row.title,
            imprint: row.imprint,
            due_back: row.due_back,
            status: row.status,
            borrower_id: row.borrower_id,
            borrower: row.borrower,
            is_overdue,
        }
    }
}

/// Renewal request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenewBookRequest {
    /// New due date, between today and four weeks out
    pub renewal_date: NaiveDate,
}

/// Renewal form description returned before posting a renewal
#[derive(Debug, Serialize, ToSchema)]
pub struct RenewalForm {
    pub instance_id: Uuid,
    pub book_title: String,
    pub borrower: Option<String>,
    pub due_back: Option<NaiveDate>,
    pub label: String,
    pub help_text: String,
    /// Proposed new due date (three weeks from today)
    pub renewal_date: NaiveDate,
}

/// Create book instance request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookInstance {
    pub book_id: i32,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1-200 characters"))]
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    #[serde(default)]
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

/// Update book instance request. Replaces every field.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBookInstance {
    pub book_id: i32,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1-200 characters"))]
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instance(due_back: Option<NaiveDate>, status: LoanStatus) -> BookInstance {
        BookInstance {
            id: Uuid::nil(),
            book_id: 1,
            imprint: "London : Gollancz, 2014.".to_string(),
            due_back,
            status,
            borrower_id: None,
        }
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            LoanStatus::Maintenance,
            LoanStatus::OnLoan,
            LoanStatus::Available,
            LoanStatus::Reserved,
        ] {
            assert_eq!(status.code().parse::<LoanStatus>().unwrap(), status);
        }
        assert!("x".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(LoanStatus::Maintenance.label(), "Maintenance");
        assert_eq!(LoanStatus::OnLoan.label(), "On loan");
        assert_eq!(LoanStatus::Available.label(), "Available");
        assert_eq!(LoanStatus::Reserved.label(), "Reserved");
    }

    #[test]
    fn test_default_status_is_maintenance() {
        assert_eq!(LoanStatus::default(), LoanStatus::Maintenance);
    }

    #[test]
    fn test_is_overdue() {
        let today = date(2024, 9, 20);

        // No due date, never overdue
        assert!(!instance(None, LoanStatus::Maintenance).is_overdue(today));
        // Due today is not overdue yet
        assert!(!instance(Some(today), LoanStatus::OnLoan).is_overdue(today));
        // Due yesterday is overdue
        assert!(instance(Some(date(2024, 9, 19)), LoanStatus::OnLoan).is_overdue(today));
        // Overdue is a date check only, status does not matter
        assert!(instance(Some(date(2024, 9, 19)), LoanStatus::Available).is_overdue(today));
    }

    #[test]
    fn test_loan_entry_overdue_matches_instance_rule() {
        let today = date(2024, 9, 20);

        for due_back in [None, Some(date(2024, 9, 19)), Some(today), Some(date(2024, 9, 21))] {
            let row = LoanRow {
                id: Uuid::nil(),
                book_id: 1,
                title: "The Name of the Wind".to_string(),
                imprint: "London : Gollancz, 2014.".to_string(),
                due_back,
                status: LoanStatus::OnLoan,
                borrower_id: Some(7),
                borrower: Some("patron".to_string()),
            };
            let entry = LoanEntry::from_row(row, today);
            assert_eq!(
                entry.is_overdue,
                instance(due_back, LoanStatus::OnLoan).is_overdue(today)
            );
        }
    }
}

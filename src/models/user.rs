//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Named permission granted to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Capability {
    /// Renew loans and mark copies returned; also gates author maintenance
    #[serde(rename = "can_mark_returned")]
    MarkReturned,
    #[serde(rename = "can_edit_book")]
    EditBook,
    #[serde(rename = "can_delete_book")]
    DeleteBook,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::MarkReturned => "can_mark_returned",
            Capability::EditBook => "can_edit_book",
            Capability::DeleteBook => "can_delete_book",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "can_mark_returned" => Ok(Capability::MarkReturned),
            "can_edit_book" => Ok(Capability::EditBook),
            "can_delete_book" => Ok(Capability::DeleteBook),
            _ => Err(format!("Invalid capability: {}", s)),
        }
    }
}

// SQLx conversion for Capability
impl sqlx::Type<Postgres> for Capability {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Capability {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Capability {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

/// Public user representation for listings
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UserPublic {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub capabilities: Vec<Capability>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    // Authorization checks
    pub fn require_capability(&self, capability: Capability) -> Result<(), AppError> {
        if self.has_capability(capability) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Missing capability: {}",
                capability
            )))
        }
    }

    pub fn require_mark_returned(&self) -> Result<(), AppError> {
        self.require_capability(Capability::MarkReturned)
    }

    pub fn require_edit_book(&self) -> Result<(), AppError> {
        self.require_capability(Capability::EditBook)
    }

    pub fn require_delete_book(&self) -> Result<(), AppError> {
        self.require_capability(Capability::DeleteBook)
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response with a bearer token
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserPublic,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(capabilities: Vec<Capability>) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "librarian".to_string(),
            user_id: 7,
            capabilities,
            iat: now,
            exp: now + 3600,
        }
    }

    #[test]
    fn test_capability_round_trip() {
        for cap in [
            Capability::MarkReturned,
            Capability::EditBook,
            Capability::DeleteBook,
        ] {
            assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
        }
        assert!("can_fly".parse::<Capability>().is_err());
    }

    #[test]
    fn test_token_round_trip() {
        let claims = claims(vec![Capability::MarkReturned]);
        let token = claims.create_token("test-secret").unwrap();
        let parsed = UserClaims::from_token(&token, "test-secret").unwrap();

        assert_eq!(parsed.sub, "librarian");
        assert_eq!(parsed.user_id, 7);
        assert_eq!(parsed.capabilities, vec![Capability::MarkReturned]);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = claims(vec![]).create_token("test-secret").unwrap();
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_capability_checks() {
        let librarian = claims(vec![Capability::MarkReturned, Capability::EditBook]);
        assert!(librarian.require_mark_returned().is_ok());
        assert!(librarian.require_edit_book().is_ok());
        assert!(matches!(
            librarian.require_delete_book(),
            Err(AppError::Authorization(_))
        ));

        let patron = claims(vec![]);
        assert!(!patron.has_capability(Capability::MarkReturned));
        assert!(patron.require_mark_returned().is_err());
    }
}

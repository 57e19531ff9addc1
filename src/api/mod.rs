//! API handlers for the LocalLibrary REST endpoints

pub mod authors;
pub mod books;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod summary;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Uri},
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Login challenge target: the login URL with the request's path and query
/// carried in `next`, percent-encoded so it round-trips losslessly.
fn login_location(login_url: &str, uri: &Uri) -> String {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    format!("{}?next={}", login_url, urlencoding::encode(next))
}

/// Extractor for authenticated user from JWT token.
///
/// Anonymous requests (and requests with an invalid or expired token) are
/// not rejected with an error payload: they resolve to a redirect to the
/// login page, carrying the original path in `next`.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let login_redirect = || AppError::AuthRequired {
            location: login_location(&state.config.auth.login_url, &parts.uri),
        };

        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(login_redirect)?;

        // Check for Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(login_redirect)?;

        // Validate JWT token using the secret from configuration
        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|_| login_redirect())?;

        Ok(AuthenticatedUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_location_encodes_path() {
        let uri: Uri = "/catalog/mybooks".parse().unwrap();
        assert_eq!(
            login_location("/accounts/login", &uri),
            "/accounts/login?next=%2Fcatalog%2Fmybooks"
        );
    }

    #[test]
    fn test_login_location_keeps_query_string() {
        let uri: Uri = "/catalog/allborrowed?page=2".parse().unwrap();
        assert_eq!(
            login_location("/accounts/login", &uri),
            "/accounts/login?next=%2Fcatalog%2Fallborrowed%3Fpage%3D2"
        );
    }
}

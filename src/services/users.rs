//! User management service (registration, login, dashboard)

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{LoginResponse, RegisterRequest, User, UserClaims, UserPublic},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new user. Registration signs the new user straight in,
    /// so a token is returned alongside the account.
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<LoginResponse> {
        if self
            .repository
            .users
            .username_exists(&request.username)
            .await?
        {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let password_hash = self.hash_password(&request.password)?;
        let user = self.repository.users.create(request, &password_hash).await?;

        self.login_response(user).await
    }

    /// Authenticate by username and password and issue a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| {
                AppError::Authentication("Invalid username or password".to_string())
            })?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        self.login_response(user).await
    }

    /// List all users for the dashboard
    pub async fn dashboard(&self) -> AppResult<Vec<UserPublic>> {
        self.repository.users.list().await
    }

    /// Build a login response carrying a fresh token and the user's
    /// capability grants
    async fn login_response(&self, user: User) -> AppResult<LoginResponse> {
        let capabilities = self.repository.users.get_capabilities(user.id).await?;

        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            capabilities,
            exp,
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(LoginResponse {
            token,
            user: UserPublic {
                id: user.id,
                username: user.username,
                first_name: user.first_name,
                last_name: user.last_name,
            },
        })
    }

    /// Verify user password
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

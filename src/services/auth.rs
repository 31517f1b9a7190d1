use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use crate::{
    errors::{AuthError, StoreError},
    models::user::Session,
    store::UserStore,
};

#[derive(Clone, Debug)]
pub struct AuthService<U> {
    repo: U,
}

impl<U: UserStore> AuthService<U> {
    pub fn new(repo: U) -> Self {
        Self { repo }
    }

    #[instrument(name = "AuthService: Register", skip(self, password), fields(user_email = %email))]
    pub async fn register(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AuthError::Internal
            })?
            .to_string();

        let user_id = self
            .repo
            .create_user(email, &hash)
            .await
            .map_err(|e| match e {
                StoreError::Validation(_) => {
                    tracing::warn!("Registration failed: email already taken");
                    AuthError::UserAlreadyExists
                }
                other => {
                    tracing::error!("Database error during registration: {:?}", other);
                    AuthError::Internal
                }
            })?;

        tracing::info!(%user_id, "User registered");
        Ok(Session {
            user_id,
            email: email.to_string(),
        })
    }

    #[instrument(
        name = "AuthService: Login attempt",
        skip(self, password),
        fields(user_email = %email)
    )]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        // 1. Fetch User
        let user = self.repo.find_by_email(email).await.map_err(|e| {
            tracing::error!("Database error during login: {:?}", e);
            AuthError::Internal
        })?;

        let user = match user {
            Some(u) => u,
            None => {
                tracing::warn!("Login failed: User not found");
                return Err(AuthError::WrongCredentials);
            }
        };

        // 2. Parse Hash
        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!("Failed to parse password hash from DB: {:?}", e);
            AuthError::Internal
        })?;

        // 3. Verify Password
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!("Login failed: Invalid password provided");
            return Err(AuthError::WrongCredentials);
        }

        tracing::info!("User authenticated successfully");
        Ok(Session {
            user_id: user.id,
            email: user.email,
        })
    }
}

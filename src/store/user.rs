use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::StoreError,
    models::user::UserModel,
    store::{PgStore, UserStore},
};

impl UserStore for PgStore {
    #[instrument(name = "Saving new user to database", skip(self, password_hash))]
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<Uuid, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            e
        })?;
        Ok(id)
    }

    #[instrument(name = "Fetching user by email from database", skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, StoreError> {
        let user = sqlx::query_as::<_, UserModel>(
            r#"SELECT id, email, password_hash, created_at FROM users WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user: {:?}", e);
            e
        })?;
        Ok(user)
    }
}

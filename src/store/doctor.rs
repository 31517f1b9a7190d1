use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::StoreError,
    models::{
        doctor::{Doctor, DoctorDetails, Doctors},
        user::Session,
    },
    store::{PgStore, RecordStore},
};

#[derive(Debug, FromRow)]
struct DoctorRow {
    id: Uuid,
    full_name: String,
    specialization: String,
    qualification: Option<String>,
    phone: String,
    email: String,
    city: String,
    created_at: DateTime<Utc>,
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        Doctor {
            id: row.id,
            created_at: row.created_at,
            details: DoctorDetails {
                full_name: row.full_name,
                specialization: row.specialization,
                qualification: row.qualification,
                phone: row.phone,
                email: row.email,
                city: row.city,
            },
        }
    }
}

impl RecordStore<Doctors> for PgStore {
    #[instrument(name = "Listing doctors", skip(self, session), fields(user_id = %session.user_id))]
    async fn list(&self, session: &Session) -> Result<Vec<Doctor>, StoreError> {
        let rows = sqlx::query_as::<_, DoctorRow>(
            r#"SELECT id, full_name, specialization, qualification, phone, email, city, created_at
            FROM doctors
            WHERE user_id = $1
            ORDER BY created_at DESC"#,
        )
        .bind(session.user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    #[instrument(name = "Fetching doctor", skip(self, session), fields(user_id = %session.user_id))]
    async fn fetch(&self, session: &Session, id: Uuid) -> Result<Doctor, StoreError> {
        sqlx::query_as::<_, DoctorRow>(
            r#"SELECT id, full_name, specialization, qualification, phone, email, city, created_at
            FROM doctors
            WHERE id = $1 AND user_id = $2"#,
        )
        .bind(id)
        .bind(session.user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Doctor::from)
        .ok_or(StoreError::NotFound)
    }

    #[instrument(name = "Saving new doctor", skip(self, session, details), fields(user_id = %session.user_id))]
    async fn insert(&self, session: &Session, details: &DoctorDetails) -> Result<Doctor, StoreError> {
        let row = sqlx::query_as::<_, DoctorRow>(
            r#"INSERT INTO doctors (user_id, full_name, specialization, qualification, phone, email, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, full_name, specialization, qualification, phone, email, city, created_at"#,
        )
        .bind(session.user_id)
        .bind(&details.full_name)
        .bind(&details.specialization)
        .bind(&details.qualification)
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.city)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert doctor: {:?}", e);
            e
        })?;
        Ok(row.into())
    }

    #[instrument(name = "Updating doctor", skip(self, session, details), fields(user_id = %session.user_id))]
    async fn update(
        &self,
        session: &Session,
        id: Uuid,
        details: &DoctorDetails,
    ) -> Result<Doctor, StoreError> {
        sqlx::query_as::<_, DoctorRow>(
            r#"UPDATE doctors
            SET full_name = $3, specialization = $4, qualification = $5, phone = $6,
                email = $7, city = $8
            WHERE id = $1 AND user_id = $2
            RETURNING id, full_name, specialization, qualification, phone, email, city, created_at"#,
        )
        .bind(id)
        .bind(session.user_id)
        .bind(&details.full_name)
        .bind(&details.specialization)
        .bind(&details.qualification)
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.city)
        .fetch_optional(&self.pool)
        .await?
        .map(Doctor::from)
        .ok_or(StoreError::NotFound)
    }

    #[instrument(name = "Deleting doctor", skip(self, session), fields(user_id = %session.user_id))]
    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM doctors WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(session.user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count(&self, session: &Session) -> Result<i64, StoreError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM doctors WHERE user_id = $1")
                .bind(session.user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

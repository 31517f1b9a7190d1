use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::StoreError,
    models::{
        form::ValidationError,
        patient::{Patient, PatientDetails, Patients},
        user::Session,
    },
    store::{PgStore, RecordStore},
};

/// Patient columns as stored. Choice fields are plain text in the table.
#[derive(Debug, FromRow)]
struct PatientRow {
    id: Uuid,
    full_name: String,
    age: i32,
    gender: String,
    phone: String,
    email: String,
    address: Option<String>,
    city: String,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    blood_group: Option<String>,
    medical_history: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = StoreError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let unreadable = |e: ValidationError| StoreError::Transport(format!("unreadable patient {id}: {e}"));
        let details = PatientDetails {
            gender: row.gender.parse().map_err(unreadable)?,
            blood_group: row
                .blood_group
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(unreadable)?,
            full_name: row.full_name,
            age: row.age,
            phone: row.phone,
            email: row.email,
            address: row.address,
            city: row.city,
            height_cm: row.height_cm,
            weight_kg: row.weight_kg,
            medical_history: row.medical_history,
        };
        Ok(Patient::new(row.id, row.created_at, details))
    }
}

impl RecordStore<Patients> for PgStore {
    #[instrument(name = "Listing patients", skip(self, session), fields(user_id = %session.user_id))]
    async fn list(&self, session: &Session) -> Result<Vec<Patient>, StoreError> {
        sqlx::query_as::<_, PatientRow>(
            r#"SELECT id, full_name, age, gender, phone, email, address, city,
                      height_cm, weight_kg, blood_group, medical_history, created_at
            FROM patients
            WHERE user_id = $1
            ORDER BY created_at DESC"#,
        )
        .bind(session.user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Patient::try_from)
        .collect()
    }

    #[instrument(name = "Fetching patient", skip(self, session), fields(user_id = %session.user_id))]
    async fn fetch(&self, session: &Session, id: Uuid) -> Result<Patient, StoreError> {
        let row = sqlx::query_as::<_, PatientRow>(
            r#"SELECT id, full_name, age, gender, phone, email, address, city,
                      height_cm, weight_kg, blood_group, medical_history, created_at
            FROM patients
            WHERE id = $1 AND user_id = $2"#,
        )
        .bind(id)
        .bind(session.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        row.try_into()
    }

    #[instrument(name = "Saving new patient", skip(self, session, details), fields(user_id = %session.user_id))]
    async fn insert(
        &self,
        session: &Session,
        details: &PatientDetails,
    ) -> Result<Patient, StoreError> {
        let row = sqlx::query_as::<_, PatientRow>(
            r#"INSERT INTO patients (user_id, full_name, age, gender, phone, email, address, city,
                                     height_cm, weight_kg, blood_group, medical_history)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, full_name, age, gender, phone, email, address, city,
                      height_cm, weight_kg, blood_group, medical_history, created_at"#,
        )
        .bind(session.user_id)
        .bind(&details.full_name)
        .bind(details.age)
        .bind(details.gender.as_str())
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.address)
        .bind(&details.city)
        .bind(details.height_cm)
        .bind(details.weight_kg)
        .bind(details.blood_group.map(|g| g.as_str()))
        .bind(&details.medical_history)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert patient: {:?}", e);
            e
        })?;
        row.try_into()
    }

    #[instrument(name = "Updating patient", skip(self, session, details), fields(user_id = %session.user_id))]
    async fn update(
        &self,
        session: &Session,
        id: Uuid,
        details: &PatientDetails,
    ) -> Result<Patient, StoreError> {
        let row = sqlx::query_as::<_, PatientRow>(
            r#"UPDATE patients
            SET full_name = $3, age = $4, gender = $5, phone = $6, email = $7, address = $8,
                city = $9, height_cm = $10, weight_kg = $11, blood_group = $12,
                medical_history = $13
            WHERE id = $1 AND user_id = $2
            RETURNING id, full_name, age, gender, phone, email, address, city,
                      height_cm, weight_kg, blood_group, medical_history, created_at"#,
        )
        .bind(id)
        .bind(session.user_id)
        .bind(&details.full_name)
        .bind(details.age)
        .bind(details.gender.as_str())
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.address)
        .bind(&details.city)
        .bind(details.height_cm)
        .bind(details.weight_kg)
        .bind(details.blood_group.map(|g| g.as_str()))
        .bind(&details.medical_history)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        row.try_into()
    }

    #[instrument(name = "Deleting patient", skip(self, session), fields(user_id = %session.user_id))]
    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1 AND user_id = $2")
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
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM patients WHERE user_id = $1")
                .bind(session.user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

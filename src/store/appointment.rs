use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::prelude::FromRow;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::StoreError,
    models::{
        appointment::{Appointment, AppointmentDetails, AppointmentStatus, Appointments},
        user::Session,
    },
    store::{AppointmentStore, PgStore, RecordStore},
};

/// An appointment joined with the names it refers to.
#[derive(Debug, FromRow)]
struct AppointmentRow {
    id: Uuid,
    patient_id: Uuid,
    doctor_id: Uuid,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    status: String,
    reason: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    patient_name: String,
    doctor_name: String,
    doctor_specialization: String,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = StoreError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<AppointmentStatus>().map_err(|e| {
            StoreError::Transport(format!("unreadable appointment {}: {e}", row.id))
        })?;
        Ok(Appointment {
            id: row.id,
            created_at: row.created_at,
            details: AppointmentDetails {
                patient_id: row.patient_id,
                doctor_id: row.doctor_id,
                appointment_date: row.appointment_date,
                appointment_time: row.appointment_time,
                status,
                reason: row.reason,
                notes: row.notes,
            },
            patient_name: row.patient_name,
            doctor_name: row.doctor_name,
            doctor_specialization: row.doctor_specialization,
        })
    }
}

impl RecordStore<Appointments> for PgStore {
    #[instrument(name = "Listing appointments", skip(self, session), fields(user_id = %session.user_id))]
    async fn list(&self, session: &Session) -> Result<Vec<Appointment>, StoreError> {
        sqlx::query_as::<_, AppointmentRow>(
            r#"SELECT a.id, a.patient_id, a.doctor_id, a.appointment_date, a.appointment_time,
                      a.status, a.reason, a.notes, a.created_at,
                      p.full_name AS patient_name,
                      d.full_name AS doctor_name,
                      d.specialization AS doctor_specialization
            FROM appointments a
            JOIN patients p ON p.id = a.patient_id
            JOIN doctors d ON d.id = a.doctor_id
            WHERE a.user_id = $1
            ORDER BY a.appointment_date DESC, a.appointment_time DESC"#,
        )
        .bind(session.user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Appointment::try_from)
        .collect()
    }

    #[instrument(name = "Fetching appointment", skip(self, session), fields(user_id = %session.user_id))]
    async fn fetch(&self, session: &Session, id: Uuid) -> Result<Appointment, StoreError> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r#"SELECT a.id, a.patient_id, a.doctor_id, a.appointment_date, a.appointment_time,
                      a.status, a.reason, a.notes, a.created_at,
                      p.full_name AS patient_name,
                      d.full_name AS doctor_name,
                      d.specialization AS doctor_specialization
            FROM appointments a
            JOIN patients p ON p.id = a.patient_id
            JOIN doctors d ON d.id = a.doctor_id
            WHERE a.id = $1 AND a.user_id = $2"#,
        )
        .bind(id)
        .bind(session.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        row.try_into()
    }

    /// The patient and doctor must belong to the same owner as the appointment.
    #[instrument(name = "Saving new appointment", skip(self, session, details), fields(user_id = %session.user_id))]
    async fn insert(
        &self,
        session: &Session,
        details: &AppointmentDetails,
    ) -> Result<Appointment, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO appointments (user_id, patient_id, doctor_id, appointment_date,
                                         appointment_time, status, reason, notes)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE EXISTS (SELECT 1 FROM patients WHERE id = $2 AND user_id = $1)
              AND EXISTS (SELECT 1 FROM doctors WHERE id = $3 AND user_id = $1)
            RETURNING id"#,
        )
        .bind(session.user_id)
        .bind(details.patient_id)
        .bind(details.doctor_id)
        .bind(details.appointment_date)
        .bind(details.appointment_time)
        .bind(details.status.as_str())
        .bind(&details.reason)
        .bind(&details.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert appointment: {:?}", e);
            e
        })?
        .ok_or_else(|| StoreError::Validation("Unknown patient or doctor".into()))?;

        <Self as RecordStore<Appointments>>::fetch(self, session, id).await
    }

    #[instrument(name = "Updating appointment", skip(self, session, details), fields(user_id = %session.user_id))]
    async fn update(
        &self,
        session: &Session,
        id: Uuid,
        details: &AppointmentDetails,
    ) -> Result<Appointment, StoreError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"UPDATE appointments
            SET patient_id = $3, doctor_id = $4, appointment_date = $5, appointment_time = $6,
                status = $7, reason = $8, notes = $9
            WHERE id = $1 AND user_id = $2
              AND EXISTS (SELECT 1 FROM patients WHERE id = $3 AND user_id = $2)
              AND EXISTS (SELECT 1 FROM doctors WHERE id = $4 AND user_id = $2)
            RETURNING id"#,
        )
        .bind(id)
        .bind(session.user_id)
        .bind(details.patient_id)
        .bind(details.doctor_id)
        .bind(details.appointment_date)
        .bind(details.appointment_time)
        .bind(details.status.as_str())
        .bind(&details.reason)
        .bind(&details.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        <Self as RecordStore<Appointments>>::fetch(self, session, id).await
    }

    #[instrument(name = "Deleting appointment", skip(self, session), fields(user_id = %session.user_id))]
    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND user_id = $2")
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
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM appointments WHERE user_id = $1")
                .bind(session.user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

impl AppointmentStore for PgStore {
    async fn count_on(&self, session: &Session, date: NaiveDate) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM appointments WHERE user_id = $1 AND appointment_date = $2",
        )
        .bind(session.user_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

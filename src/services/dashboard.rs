use chrono::NaiveDate;
use serde::Serialize;
use tracing::instrument;

use crate::{
    errors::StoreError,
    models::{appointment::Appointments, doctor::Doctors, patient::Patients, user::Session},
    store::{AppointmentStore, RecordStore},
};

/// Aggregate counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub patients: i64,
    pub doctors: i64,
    pub appointments: i64,
    pub today_appointments: i64,
}

#[derive(Clone, Debug)]
pub struct DashboardService<S> {
    store: S,
}

impl<S> DashboardService<S>
where
    S: RecordStore<Patients> + RecordStore<Doctors> + AppointmentStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Runs the four counts concurrently. If any of them fails, no partial
    /// numbers are returned.
    #[instrument(name = "Service: Dashboard stats", skip(self, session), fields(user_id = %session.user_id))]
    pub async fn stats(&self, session: &Session, today: NaiveDate) -> Result<Stats, StoreError> {
        let (patients, doctors, appointments, today_appointments) = tokio::try_join!(
            <S as RecordStore<Patients>>::count(&self.store, session),
            <S as RecordStore<Doctors>>::count(&self.store, session),
            <S as RecordStore<Appointments>>::count(&self.store, session),
            self.store.count_on(session, today),
        )
        .map_err(|e| {
            tracing::error!("Failed to fetch statistics: {}", e);
            e
        })?;

        Ok(Stats {
            patients,
            doctors,
            appointments,
            today_appointments,
        })
    }
}

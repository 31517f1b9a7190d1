#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use healthdesk::{
    errors::StoreError,
    models::{
        appointment::{Appointment, AppointmentDetails, AppointmentStatus, Appointments},
        doctor::{Doctor, DoctorDetails, Doctors},
        patient::{Gender, Patient, PatientDetails, Patients},
        user::{Session, UserModel},
    },
    routes::auth::Keys,
    startup::{AppState, router},
    store::{AppointmentStore, RecordStore, UserStore},
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserModel>,
    patients: Vec<(Uuid, Patient)>,
    doctors: Vec<(Uuid, Doctor)>,
    appointments: Vec<(Uuid, Uuid, DateTime<Utc>, AppointmentDetails)>,
}

/// Owner-scoped tables in memory, with call counters and failure switches.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    pub deletes: Arc<AtomicUsize>,
    pub writes: Arc<AtomicUsize>,
    pub fail_doctor_count: Arc<AtomicBool>,
    pub fail_reads: Arc<AtomicBool>,
}

impl MemoryStore {
    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn joined(tables: &Tables, owner: Uuid, id: Uuid) -> Option<Appointment> {
        let (_, _, created_at, details) = tables
            .appointments
            .iter()
            .find(|(o, i, _, _)| *o == owner && *i == id)?;
        let patient = tables
            .patients
            .iter()
            .find(|(o, p)| *o == owner && p.id == details.patient_id)?;
        let doctor = tables
            .doctors
            .iter()
            .find(|(o, d)| *o == owner && d.id == details.doctor_id)?;
        Some(Appointment {
            id,
            created_at: *created_at,
            details: details.clone(),
            patient_name: patient.1.details.full_name.clone(),
            doctor_name: doctor.1.details.full_name.clone(),
            doctor_specialization: doctor.1.details.specialization.clone(),
        })
    }
}

impl UserStore for MemoryStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<Uuid, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Validation(
                "duplicate key value violates unique constraint \"users_email_key\"".into(),
            ));
        }
        let id = Uuid::new_v4();
        tables.users.push(UserModel {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }
}

impl RecordStore<Patients> for MemoryStore {
    async fn list(&self, session: &Session) -> Result<Vec<Patient>, StoreError> {
        self.check_read()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .patients
            .iter()
            .rev()
            .filter(|(owner, _)| *owner == session.user_id)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn fetch(&self, session: &Session, id: Uuid) -> Result<Patient, StoreError> {
        self.check_read()?;
        let tables = self.tables.lock().unwrap();
        tables
            .patients
            .iter()
            .find(|(owner, p)| *owner == session.user_id && p.id == id)
            .map(|(_, p)| p.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn insert(
        &self,
        session: &Session,
        details: &PatientDetails,
    ) -> Result<Patient, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let patient = Patient::new(Uuid::new_v4(), Utc::now(), details.clone());
        let mut tables = self.tables.lock().unwrap();
        tables.patients.push((session.user_id, patient.clone()));
        Ok(patient)
    }

    async fn update(
        &self,
        session: &Session,
        id: Uuid,
        details: &PatientDetails,
    ) -> Result<Patient, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let (_, row) = tables
            .patients
            .iter_mut()
            .find(|(owner, p)| *owner == session.user_id && p.id == id)
            .ok_or(StoreError::NotFound)?;
        *row = Patient::new(id, row.created_at, details.clone());
        Ok(row.clone())
    }

    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let before = tables.patients.len();
        tables
            .patients
            .retain(|(owner, p)| !(*owner == session.user_id && p.id == id));
        if tables.patients.len() == before {
            return Err(StoreError::NotFound);
        }
        tables
            .appointments
            .retain(|(_, _, _, a)| a.patient_id != id);
        Ok(())
    }

    async fn count(&self, session: &Session) -> Result<i64, StoreError> {
        self.check_read()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .patients
            .iter()
            .filter(|(owner, _)| *owner == session.user_id)
            .count() as i64)
    }
}

impl RecordStore<Doctors> for MemoryStore {
    async fn list(&self, session: &Session) -> Result<Vec<Doctor>, StoreError> {
        self.check_read()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .doctors
            .iter()
            .rev()
            .filter(|(owner, _)| *owner == session.user_id)
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn fetch(&self, session: &Session, id: Uuid) -> Result<Doctor, StoreError> {
        self.check_read()?;
        let tables = self.tables.lock().unwrap();
        tables
            .doctors
            .iter()
            .find(|(owner, d)| *owner == session.user_id && d.id == id)
            .map(|(_, d)| d.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, session: &Session, details: &DoctorDetails) -> Result<Doctor, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let doctor = Doctor {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            details: details.clone(),
        };
        let mut tables = self.tables.lock().unwrap();
        tables.doctors.push((session.user_id, doctor.clone()));
        Ok(doctor)
    }

    async fn update(
        &self,
        session: &Session,
        id: Uuid,
        details: &DoctorDetails,
    ) -> Result<Doctor, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let (_, row) = tables
            .doctors
            .iter_mut()
            .find(|(owner, d)| *owner == session.user_id && d.id == id)
            .ok_or(StoreError::NotFound)?;
        row.details = details.clone();
        Ok(row.clone())
    }

    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let before = tables.doctors.len();
        tables
            .doctors
            .retain(|(owner, d)| !(*owner == session.user_id && d.id == id));
        if tables.doctors.len() == before {
            return Err(StoreError::NotFound);
        }
        tables.appointments.retain(|(_, _, _, a)| a.doctor_id != id);
        Ok(())
    }

    async fn count(&self, session: &Session) -> Result<i64, StoreError> {
        self.check_read()?;
        if self.fail_doctor_count.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("statement timeout".into()));
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .doctors
            .iter()
            .filter(|(owner, _)| *owner == session.user_id)
            .count() as i64)
    }
}

impl RecordStore<Appointments> for MemoryStore {
    async fn list(&self, session: &Session) -> Result<Vec<Appointment>, StoreError> {
        self.check_read()?;
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Appointment> = tables
            .appointments
            .iter()
            .filter(|(owner, ..)| *owner == session.user_id)
            .filter_map(|(owner, id, ..)| Self::joined(&tables, *owner, *id))
            .collect();
        rows.sort_by(|a, b| {
            (b.details.appointment_date, b.details.appointment_time)
                .cmp(&(a.details.appointment_date, a.details.appointment_time))
        });
        Ok(rows)
    }

    async fn fetch(&self, session: &Session, id: Uuid) -> Result<Appointment, StoreError> {
        self.check_read()?;
        let tables = self.tables.lock().unwrap();
        Self::joined(&tables, session.user_id, id).ok_or(StoreError::NotFound)
    }

    async fn insert(
        &self,
        session: &Session,
        details: &AppointmentDetails,
    ) -> Result<Appointment, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let id = Uuid::new_v4();
        tables
            .appointments
            .push((session.user_id, id, Utc::now(), details.clone()));
        match Self::joined(&tables, session.user_id, id) {
            Some(appointment) => Ok(appointment),
            None => {
                tables.appointments.retain(|(_, i, ..)| *i != id);
                Err(StoreError::Validation("Unknown patient or doctor".into()))
            }
        }
    }

    async fn update(
        &self,
        session: &Session,
        id: Uuid,
        details: &AppointmentDetails,
    ) -> Result<Appointment, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .appointments
            .iter_mut()
            .find(|(owner, i, ..)| *owner == session.user_id && *i == id)
            .ok_or(StoreError::NotFound)?;
        row.3 = details.clone();
        Self::joined(&tables, session.user_id, id).ok_or(StoreError::NotFound)
    }

    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.lock().unwrap();
        let before = tables.appointments.len();
        tables
            .appointments
            .retain(|(owner, i, ..)| !(*owner == session.user_id && *i == id));
        if tables.appointments.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count(&self, session: &Session) -> Result<i64, StoreError> {
        self.check_read()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .appointments
            .iter()
            .filter(|(owner, ..)| *owner == session.user_id)
            .count() as i64)
    }
}

impl AppointmentStore for MemoryStore {
    async fn count_on(&self, session: &Session, date: NaiveDate) -> Result<i64, StoreError> {
        self.check_read()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .appointments
            .iter()
            .filter(|(owner, _, _, a)| *owner == session.user_id && a.appointment_date == date)
            .count() as i64)
    }
}

pub fn session() -> Session {
    Session {
        user_id: Uuid::new_v4(),
        email: "reception@clinic.test".into(),
    }
}

pub fn patient_details(name: &str, city: &str) -> PatientDetails {
    PatientDetails {
        full_name: name.into(),
        age: 42,
        gender: Gender::Female,
        phone: "555-0100".into(),
        email: format!("{}@mail.test", name.to_lowercase().replace(' ', ".")),
        address: None,
        city: city.into(),
        height_cm: Some(170.0),
        weight_kg: Some(68.0),
        blood_group: None,
        medical_history: None,
    }
}

pub fn doctor_details(name: &str, specialization: &str) -> DoctorDetails {
    DoctorDetails {
        full_name: name.into(),
        specialization: specialization.into(),
        qualification: Some("MD".into()),
        phone: "555-0199".into(),
        email: format!("{}@clinic.test", name.to_lowercase().replace(' ', ".")),
        city: "Pune".into(),
    }
}

pub fn appointment_details(patient_id: Uuid, doctor_id: Uuid, date: NaiveDate) -> AppointmentDetails {
    AppointmentDetails {
        patient_id,
        doctor_id,
        appointment_date: date,
        appointment_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        status: AppointmentStatus::Scheduled,
        reason: Some("Check-up".into()),
        notes: None,
    }
}

pub const SECRET: &[u8] = b"integration-test-secret";

pub fn keys() -> Keys {
    Keys::new(SECRET, chrono::Duration::hours(1))
}

pub fn app(store: MemoryStore) -> axum::Router {
    router(AppState::new(store, keys()), "public")
}

/// `Authorization` header value for `session`.
pub fn bearer(session: &Session) -> String {
    format!("Bearer {}", keys().issue(session).unwrap())
}

/// `Cookie` header value for `session`.
pub fn cookie(session: &Session) -> String {
    format!("jwt={}", keys().issue(session).unwrap())
}

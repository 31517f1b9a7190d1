//! Owner-scoped persistence.
//!
//! Services only talk to the traits below. [`PgStore`] implements all of them
//! against PostgreSQL; every statement filters on the caller's `user_id`, so a
//! row owned by someone else behaves exactly like a missing row.

mod appointment;
mod doctor;
mod patient;
pub mod user;

use std::future::Future;

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::StoreError,
    models::{
        Resource,
        appointment::Appointments,
        doctor::Doctors,
        patient::Patients,
        user::{Session, UserModel},
    },
};

/// Create/read/update/delete for one table, always on behalf of `session`.
pub trait RecordStore<R: Resource>: Send + Sync {
    /// All rows owned by the session user, in the table's display order.
    fn list(&self, session: &Session)
    -> impl Future<Output = Result<Vec<R::Row>, StoreError>> + Send;

    fn fetch(
        &self,
        session: &Session,
        id: Uuid,
    ) -> impl Future<Output = Result<R::Row, StoreError>> + Send;

    /// The store assigns the id; the session user becomes the owner.
    fn insert(
        &self,
        session: &Session,
        details: &R::Details,
    ) -> impl Future<Output = Result<R::Row, StoreError>> + Send;

    fn update(
        &self,
        session: &Session,
        id: Uuid,
        details: &R::Details,
    ) -> impl Future<Output = Result<R::Row, StoreError>> + Send;

    fn delete(
        &self,
        session: &Session,
        id: Uuid,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn count(&self, session: &Session) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

pub trait AppointmentStore: RecordStore<Appointments> {
    /// Appointments owned by the session user on `date`.
    fn count_on(
        &self,
        session: &Session,
        date: NaiveDate,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

pub trait UserStore: Send + Sync {
    fn create_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<Uuid, StoreError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserModel>, StoreError>> + Send;
}

/// Everything the application needs from storage.
pub trait Backend:
    UserStore
    + RecordStore<Patients>
    + RecordStore<Doctors>
    + AppointmentStore
    + Clone
    + std::fmt::Debug
    + 'static
{
}

impl<T> Backend for T where
    T: UserStore
        + RecordStore<Patients>
        + RecordStore<Doctors>
        + AppointmentStore
        + Clone
        + std::fmt::Debug
        + 'static
{
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

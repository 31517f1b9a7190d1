//! The list / save / confirmed-delete pattern shared by every record screen.

use std::{fmt, marker::PhantomData};

use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::{SaveError, StoreError},
    models::{
        Record, Resource,
        appointment::{AppointmentChoices, Choice},
        doctor::Doctors,
        form::Validate,
        patient::Patients,
        user::Session,
    },
    services::search::Listing,
    store::RecordStore,
};

/// Whether the user explicitly confirmed a destructive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Unconfirmed,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Unconfirmed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    /// Nothing was sent to the store.
    Cancelled,
}

/// Result of a successful create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved<T> {
    pub row: T,
    pub created: bool,
}

pub fn created_message<R: Resource>() -> String {
    format!("{} {} successfully", R::TITLE, R::CREATED)
}

pub fn updated_message<R: Resource>() -> String {
    format!("{} updated successfully", R::TITLE)
}

pub fn deleted_message<R: Resource>() -> String {
    format!("{} deleted successfully", R::TITLE)
}

pub fn fetch_failed<R: Resource>() -> String {
    format!("Failed to fetch {}", R::PLURAL)
}

pub fn save_failed<R: Resource>() -> String {
    format!("Failed to save {}", R::NOUN)
}

pub fn delete_failed<R: Resource>() -> String {
    format!("Failed to delete {}", R::NOUN)
}

impl<T> Saved<T> {
    pub fn message<R: Resource>(&self) -> String {
        if self.created {
            created_message::<R>()
        } else {
            updated_message::<R>()
        }
    }
}

/// CRUD for one resource on top of any store that holds it.
pub struct RecordService<R, S> {
    store: S,
    _resource: PhantomData<fn() -> R>,
}

impl<R, S: Clone> Clone for RecordService<R, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource, S: fmt::Debug> fmt::Debug for RecordService<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordService")
            .field("resource", &R::PLURAL)
            .field("store", &self.store)
            .finish()
    }
}

impl<R, S> RecordService<R, S>
where
    R: Resource,
    S: RecordStore<R>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _resource: PhantomData,
        }
    }

    /// Reads every row the session user owns and applies `query` to them.
    #[instrument(name = "Service: List records", skip(self, session), fields(resource = R::PLURAL))]
    pub async fn list(&self, session: &Session, query: &str) -> Result<Listing<R::Row>, StoreError> {
        let rows = <S as RecordStore<R>>::list(&self.store, session).await?;
        Ok(Listing::new(rows, query))
    }

    pub async fn fetch(&self, session: &Session, id: Uuid) -> Result<R::Row, StoreError> {
        <S as RecordStore<R>>::fetch(&self.store, session, id).await
    }

    /// Creates a row when `id` is `None`, otherwise updates the row with that id.
    /// Invalid details never reach the store.
    #[instrument(name = "Service: Save record", skip(self, session, details), fields(resource = R::PLURAL))]
    pub async fn save(
        &self,
        session: &Session,
        id: Option<Uuid>,
        details: R::Details,
    ) -> Result<Saved<R::Row>, SaveError> {
        details.validate().map_err(|e| {
            tracing::warn!("Rejected {} before saving: {}", R::NOUN, e);
            e
        })?;

        let saved = match id {
            None => Saved {
                row: <S as RecordStore<R>>::insert(&self.store, session, &details).await?,
                created: true,
            },
            Some(id) => Saved {
                row: <S as RecordStore<R>>::update(&self.store, session, id, &details).await?,
                created: false,
            },
        };
        tracing::info!(id = %saved.row.id(), created = saved.created, "Saved {}", R::NOUN);
        Ok(saved)
    }

    #[instrument(name = "Service: Delete record", skip(self, session), fields(resource = R::PLURAL))]
    pub async fn delete(
        &self,
        session: &Session,
        id: Uuid,
        confirmation: Confirmation,
    ) -> Result<Deletion, StoreError> {
        if confirmation == Confirmation::Unconfirmed {
            tracing::info!("Delete of {} {} not confirmed", R::NOUN, id);
            return Ok(Deletion::Cancelled);
        }
        <S as RecordStore<R>>::delete(&self.store, session, id).await?;
        Ok(Deletion::Deleted)
    }
}

/// Patients and doctors the session user can book, each sorted by name.
pub async fn appointment_choices<S>(
    store: &S,
    session: &Session,
) -> Result<AppointmentChoices, StoreError>
where
    S: RecordStore<Patients> + RecordStore<Doctors>,
{
    let patients = <S as RecordStore<Patients>>::list(store, session).await?;
    let doctors = <S as RecordStore<Doctors>>::list(store, session).await?;

    let mut patients: Vec<Choice> = patients
        .into_iter()
        .map(|p| Choice {
            id: p.id,
            label: p.details.full_name,
        })
        .collect();
    let mut doctors: Vec<Choice> = doctors
        .into_iter()
        .map(|d| Choice {
            id: d.id,
            label: format!("{} ({})", d.details.full_name, d.details.specialization),
        })
        .collect();
    patients.sort_by_key(|c| c.label.to_lowercase());
    doctors.sort_by_key(|c| c.label.to_lowercase());

    Ok(AppointmentChoices { patients, doctors })
}

pub mod appointment;
pub mod doctor;
pub mod form;
pub mod patient;
pub mod user;
pub mod vitals;

use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::models::form::Validate;

/// One owner-scoped table: its stored row type and the payload a user submits.
pub trait Resource: Send + Sync + 'static {
    type Row: Record;
    type Details: Validate + Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Capitalised singular, e.g. `Patient`.
    const TITLE: &'static str;
    /// Lower-case singular, e.g. `patient`.
    const NOUN: &'static str;
    /// Lower-case plural, also the URL segment and table name.
    const PLURAL: &'static str;
    /// Past participle shown after a successful create.
    const CREATED: &'static str = "added";
}

/// A stored row as read back for its owner.
pub trait Record: Serialize + Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    /// Fields the list screens search, in no particular order.
    fn search_fields(&self) -> Vec<&str>;

    /// Short human description used by the delete confirmation screen.
    fn summary(&self) -> String;
}

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Record, Resource,
    form::{self, Validate, ValidationError},
};

/// Closed set of appointment states. Anything else is rejected while parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [Self; 4] = [
        Self::Scheduled,
        Self::Completed,
        Self::Cancelled,
        Self::NoShow,
    ];

    /// Stored and posted value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no-show",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::NoShow => "No Show",
        }
    }

    pub fn tone(self) -> &'static str {
        match self {
            Self::Scheduled => "default",
            Self::Completed => "success",
            Self::Cancelled => "destructive",
            Self::NoShow => "warning",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidChoice {
                field: "status",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for AppointmentDetails {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.patient_id.is_nil() {
            return Err(ValidationError::Required("patient_id"));
        }
        if self.doctor_id.is_nil() {
            return Err(ValidationError::Required("doctor_id"));
        }
        Ok(())
    }
}

/// An appointment with the names of the people it joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: AppointmentDetails,
    pub patient_name: String,
    pub doctor_name: String,
    pub doctor_specialization: String,
}

impl Appointment {
    pub fn time_label(&self) -> String {
        self.details.appointment_time.format("%H:%M").to_string()
    }
}

impl Record for Appointment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name.as_str(),
            self.doctor_name.as_str(),
            self.details.status.as_str(),
        ]
    }

    fn summary(&self) -> String {
        format!(
            "{} with Dr. {} on {} at {}",
            self.patient_name,
            self.doctor_name,
            self.details.appointment_date,
            self.time_label()
        )
    }
}

pub struct Appointments;

impl Resource for Appointments {
    type Row = Appointment;
    type Details = AppointmentDetails;

    const TITLE: &'static str = "Appointment";
    const NOUN: &'static str = "appointment";
    const PLURAL: &'static str = "appointments";
    const CREATED: &'static str = "scheduled";
}

/// One entry of a patient or doctor drop-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: Uuid,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentChoices {
    pub patients: Vec<Choice>,
    pub doctors: Vec<Choice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentForm {
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub status: String,
    pub reason: String,
    pub notes: String,
}

impl AppointmentForm {
    pub fn blank() -> Self {
        Self {
            status: AppointmentStatus::Scheduled.as_str().to_string(),
            ..Self::default()
        }
    }
}

impl From<&AppointmentDetails> for AppointmentForm {
    fn from(details: &AppointmentDetails) -> Self {
        Self {
            patient_id: details.patient_id.to_string(),
            doctor_id: details.doctor_id.to_string(),
            appointment_date: details.appointment_date.format("%Y-%m-%d").to_string(),
            appointment_time: details.appointment_time.format("%H:%M").to_string(),
            status: details.status.as_str().to_string(),
            reason: details.reason.clone().unwrap_or_default(),
            notes: details.notes.clone().unwrap_or_default(),
        }
    }
}

impl TryFrom<AppointmentForm> for AppointmentDetails {
    type Error = ValidationError;

    fn try_from(form: AppointmentForm) -> Result<Self, Self::Error> {
        let details = Self {
            patient_id: form::parse("patient_id", &form.patient_id)?,
            doctor_id: form::parse("doctor_id", &form.doctor_id)?,
            appointment_date: form::date("appointment_date", &form.appointment_date)?,
            appointment_time: form::time("appointment_time", &form.appointment_time)?,
            status: form::choice("status", &form.status)?,
            reason: form::optional(&form.reason),
            notes: form::optional(&form.notes),
        };
        details.validate()?;
        Ok(details)
    }
}

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Record, Resource,
    form::{self, Validate, ValidationError},
    vitals::{Bmi, BmiCategory},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidChoice {
                field: "gender",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const ALL: [Self; 8] = [
        Self::APositive,
        Self::ANegative,
        Self::BPositive,
        Self::BNegative,
        Self::AbPositive,
        Self::AbNegative,
        Self::OPositive,
        Self::ONegative,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidChoice {
                field: "blood_group",
                value: s.to_string(),
            })
    }
}

/// Everything a user enters about a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub full_name: String,
    pub age: i32,
    pub gender: Gender,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    pub city: String,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub blood_group: Option<BloodGroup>,
    #[serde(default)]
    pub medical_history: Option<String>,
}

impl Validate for PatientDetails {
    fn validate(&self) -> Result<(), ValidationError> {
        form::required_text("full_name", &self.full_name)?;
        if self.age < 1 {
            return Err(ValidationError::OutOfRange {
                field: "age",
                constraint: "at least 1",
            });
        }
        form::required_text("phone", &self.phone)?;
        form::email("email", &self.email)?;
        form::required_text("city", &self.city)?;
        form::non_negative("height_cm", self.height_cm)?;
        form::non_negative("weight_kg", self.weight_kg)?;
        Ok(())
    }
}

/// A patient row with its derived vitals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: PatientDetails,
    pub bmi: Option<Bmi>,
    pub bmi_category: BmiCategory,
}

impl Patient {
    pub fn new(id: Uuid, created_at: DateTime<Utc>, details: PatientDetails) -> Self {
        let bmi = Bmi::from_measurements(details.height_cm, details.weight_kg);
        Self {
            id,
            created_at,
            details,
            bmi,
            bmi_category: BmiCategory::of(bmi),
        }
    }
}

impl Record for Patient {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.details.full_name.as_str(),
            self.details.email.as_str(),
            self.details.city.as_str(),
        ]
    }

    fn summary(&self) -> String {
        format!("{} ({})", self.details.full_name, self.details.city)
    }
}

pub struct Patients;

impl Resource for Patients {
    type Row = Patient;
    type Details = PatientDetails;

    const TITLE: &'static str = "Patient";
    const NOUN: &'static str = "patient";
    const PLURAL: &'static str = "patients";
}

/// Raw patient form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatientForm {
    pub full_name: String,
    pub age: String,
    pub gender: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub height_cm: String,
    pub weight_kg: String,
    pub blood_group: String,
    pub medical_history: String,
}

impl PatientForm {
    pub fn blank() -> Self {
        Self {
            gender: Gender::Male.as_str().to_string(),
            ..Self::default()
        }
    }
}

impl From<&PatientDetails> for PatientForm {
    fn from(details: &PatientDetails) -> Self {
        let number = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        Self {
            full_name: details.full_name.clone(),
            age: details.age.to_string(),
            gender: details.gender.as_str().to_string(),
            phone: details.phone.clone(),
            email: details.email.clone(),
            address: details.address.clone().unwrap_or_default(),
            city: details.city.clone(),
            height_cm: number(details.height_cm),
            weight_kg: number(details.weight_kg),
            blood_group: details
                .blood_group
                .map(|g| g.as_str().to_string())
                .unwrap_or_default(),
            medical_history: details.medical_history.clone().unwrap_or_default(),
        }
    }
}

impl TryFrom<PatientForm> for PatientDetails {
    type Error = ValidationError;

    fn try_from(form: PatientForm) -> Result<Self, Self::Error> {
        let details = Self {
            full_name: form::required("full_name", &form.full_name)?,
            age: form::parse("age", &form.age)?,
            gender: form::choice("gender", &form.gender)?,
            phone: form::required("phone", &form.phone)?,
            email: form::required("email", &form.email)?,
            address: form::optional(&form.address),
            city: form::required("city", &form.city)?,
            height_cm: form::parse_optional("height_cm", &form.height_cm)?,
            weight_kg: form::parse_optional("weight_kg", &form.weight_kg)?,
            blood_group: form::optional_choice("blood_group", &form.blood_group)?,
            medical_history: form::optional(&form.medical_history),
        };
        details.validate()?;
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> PatientForm {
        PatientForm {
            full_name: "Asha Rao".into(),
            age: "34".into(),
            gender: "Female".into(),
            phone: "+91 98200 00000".into(),
            email: "asha@example.org".into(),
            city: "Pune".into(),
            height_cm: "170".into(),
            weight_kg: "68".into(),
            blood_group: "AB+".into(),
            ..PatientForm::default()
        }
    }

    #[test]
    fn form_parses_into_details() {
        let details = PatientDetails::try_from(form()).unwrap();
        assert_eq!(details.gender, Gender::Female);
        assert_eq!(details.blood_group, Some(BloodGroup::AbPositive));
        assert_eq!(details.address, None);
        assert_eq!(details.height_cm, Some(170.0));
    }

    #[test]
    fn patient_derives_bmi_on_read() {
        let details = PatientDetails::try_from(form()).unwrap();
        let patient = Patient::new(Uuid::new_v4(), Utc::now(), details);
        assert_eq!(patient.bmi.map(|b| b.to_string()), Some("23.53".to_string()));
        assert_eq!(patient.bmi_category, BmiCategory::Normal);

        let mut details = patient.details.clone();
        details.height_cm = None;
        let patient = Patient::new(patient.id, patient.created_at, details);
        assert_eq!(patient.bmi, None);
        assert_eq!(patient.bmi_category, BmiCategory::Unavailable);
    }

    #[test]
    fn unknown_choices_are_rejected() {
        let bad_gender = PatientForm {
            gender: "robot".into(),
            ..form()
        };
        assert_eq!(
            PatientDetails::try_from(bad_gender),
            Err(ValidationError::InvalidChoice {
                field: "gender",
                value: "robot".into()
            })
        );

        let bad_blood = PatientForm {
            blood_group: "C+".into(),
            ..form()
        };
        assert!(matches!(
            PatientDetails::try_from(bad_blood),
            Err(ValidationError::InvalidChoice { field: "blood_group", .. })
        ));
    }

    #[test]
    fn age_must_be_positive() {
        let zero = PatientForm {
            age: "0".into(),
            ..form()
        };
        assert!(matches!(
            PatientDetails::try_from(zero),
            Err(ValidationError::OutOfRange { field: "age", .. })
        ));
    }

    #[test]
    fn edit_form_round_trips_through_details() {
        let details = PatientDetails::try_from(form()).unwrap();
        let again = PatientDetails::try_from(PatientForm::from(&details)).unwrap();
        assert_eq!(details, again);
    }

    #[test]
    fn serialized_patient_carries_category() {
        let details = PatientDetails::try_from(form()).unwrap();
        let patient = Patient::new(Uuid::new_v4(), Utc::now(), details);
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["full_name"], "Asha Rao");
        assert_eq!(json["bmi_category"], "Normal");
        assert_eq!(json["blood_group"], "AB+");
    }
}

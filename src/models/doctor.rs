use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Record, Resource,
    form::{self, Validate, ValidationError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorDetails {
    pub full_name: String,
    pub specialization: String,
    #[serde(default)]
    pub qualification: Option<String>,
    pub phone: String,
    pub email: String,
    pub city: String,
}

impl Validate for DoctorDetails {
    fn validate(&self) -> Result<(), ValidationError> {
        form::required_text("full_name", &self.full_name)?;
        form::required_text("specialization", &self.specialization)?;
        form::required_text("phone", &self.phone)?;
        form::email("email", &self.email)?;
        form::required_text("city", &self.city)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Doctor {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: DoctorDetails,
}

impl Record for Doctor {
    fn id(&self) -> Uuid {
        self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.details.full_name.as_str(),
            self.details.specialization.as_str(),
            self.details.city.as_str(),
        ]
    }

    fn summary(&self) -> String {
        format!(
            "Dr. {}, {}",
            self.details.full_name, self.details.specialization
        )
    }
}

pub struct Doctors;

impl Resource for Doctors {
    type Row = Doctor;
    type Details = DoctorDetails;

    const TITLE: &'static str = "Doctor";
    const NOUN: &'static str = "doctor";
    const PLURAL: &'static str = "doctors";
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DoctorForm {
    pub full_name: String,
    pub specialization: String,
    pub qualification: String,
    pub phone: String,
    pub email: String,
    pub city: String,
}

impl From<&DoctorDetails> for DoctorForm {
    fn from(details: &DoctorDetails) -> Self {
        Self {
            full_name: details.full_name.clone(),
            specialization: details.specialization.clone(),
            qualification: details.qualification.clone().unwrap_or_default(),
            phone: details.phone.clone(),
            email: details.email.clone(),
            city: details.city.clone(),
        }
    }
}

impl TryFrom<DoctorForm> for DoctorDetails {
    type Error = ValidationError;

    fn try_from(form: DoctorForm) -> Result<Self, Self::Error> {
        let details = Self {
            full_name: form::required("full_name", &form.full_name)?,
            specialization: form::required("specialization", &form.specialization)?,
            qualification: form::optional(&form.qualification),
            phone: form::required("phone", &form.phone)?,
            email: form::required("email", &form.email)?,
            city: form::required("city", &form.city)?,
        };
        details.validate()?;
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualification_is_optional() {
        let form = DoctorForm {
            full_name: "Meera Iyer".into(),
            specialization: "Cardiology".into(),
            qualification: "  ".into(),
            phone: "555-0101".into(),
            email: "meera@clinic.test".into(),
            city: "Chennai".into(),
        };
        let details = DoctorDetails::try_from(form).unwrap();
        assert_eq!(details.qualification, None);
    }

    #[test]
    fn specialization_is_required() {
        let form = DoctorForm {
            full_name: "Meera Iyer".into(),
            phone: "555-0101".into(),
            email: "meera@clinic.test".into(),
            city: "Chennai".into(),
            ..DoctorForm::default()
        };
        assert_eq!(
            DoctorDetails::try_from(form),
            Err(ValidationError::Required("specialization"))
        );
    }
}

//! Body-mass index derivation and banding.
//!
//! BMI is never persisted. It is derived from a patient's height and weight
//! every time a patient row is read.

use std::fmt;

use serde::Serialize;

pub const UNDERWEIGHT_BELOW: f64 = 18.5;
pub const NORMAL_BELOW: f64 = 25.0;
pub const OVERWEIGHT_BELOW: f64 = 30.0;

/// Weight in kilograms divided by the square of height in metres.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Bmi(f64);

impl Bmi {
    /// Returns `None` unless both measurements are present, finite and positive.
    pub fn from_measurements(height_cm: Option<f64>, weight_kg: Option<f64>) -> Option<Self> {
        let (height_cm, weight_kg) = (height_cm?, weight_kg?);
        if !(height_cm.is_finite() && weight_kg.is_finite()) {
            return None;
        }
        if height_cm <= 0.0 || weight_kg <= 0.0 {
            return None;
        }
        let metres = height_cm / 100.0;
        Some(Self(weight_kg / (metres * metres)))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn category(self) -> BmiCategory {
        BmiCategory::classify(self.0)
    }
}

impl fmt::Display for Bmi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
    #[serde(rename = "N/A")]
    Unavailable,
}

impl BmiCategory {
    /// Bands are closed on their lower bound: 18.5 is Normal, 25 Overweight, 30 Obese.
    pub fn classify(value: f64) -> Self {
        if value < UNDERWEIGHT_BELOW {
            Self::Underweight
        } else if value < NORMAL_BELOW {
            Self::Normal
        } else if value < OVERWEIGHT_BELOW {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    pub fn of(bmi: Option<Bmi>) -> Self {
        bmi.map_or(Self::Unavailable, Bmi::category)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
            Self::Unavailable => "N/A",
        }
    }

    /// Badge style used by the patient list.
    pub fn tone(self) -> &'static str {
        match self {
            Self::Normal => "success",
            Self::Underweight | Self::Overweight => "warning",
            Self::Obese => "destructive",
            Self::Unavailable => "secondary",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

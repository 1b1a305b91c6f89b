//! Prediction request schema
//!
//! Declares every feature field the model consumes, with defaults
//! describing a typical record. The field set and order must stay in
//! lock-step with the layout produced by [`crate::preprocess`]; the
//! parity test below holds the two together.

use crate::error::{Error, Result};
use crate::preprocess;
use serde::{Deserialize, Serialize};

/// JSON body of a prediction request.
///
/// Missing fields take their documented defaults; flag fields accept only
/// 0 or 1 and are checked eagerly by [`PredictionRequest::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionRequest {
    pub age: f64,
    pub hypertension: u8,
    pub heart_disease: u8,
    pub avg_glucose_level: f64,
    pub bmi: f64,
    #[serde(rename = "gender_Male")]
    pub gender_male: u8,
    #[serde(rename = "gender_Other")]
    pub gender_other: u8,
    #[serde(rename = "ever_married_Yes")]
    pub ever_married_yes: u8,
    #[serde(rename = "Residence_type_Urban")]
    pub residence_type_urban: u8,
    pub smoking_status_never_smoked: u8,
    pub smoking_status_smokes: u8,
    #[serde(rename = "work_type_Never_worked")]
    pub work_type_never_worked: u8,
    #[serde(rename = "work_type_Private")]
    pub work_type_private: u8,
    #[serde(rename = "work_type_Self_employed")]
    pub work_type_self_employed: u8,
    pub work_type_children: u8,
}

impl Default for PredictionRequest {
    fn default() -> Self {
        Self {
            age: 27.0,
            hypertension: 0,
            heart_disease: 0,
            avg_glucose_level: 219.84,
            bmi: 64.40,
            gender_male: 0,
            gender_other: 0,
            ever_married_yes: 1,
            residence_type_urban: 0,
            smoking_status_never_smoked: 1,
            smoking_status_smokes: 0,
            work_type_never_worked: 0,
            work_type_private: 1,
            work_type_self_employed: 0,
            work_type_children: 0,
        }
    }
}

impl PredictionRequest {
    /// Flag fields restricted to the {0,1} domain, in layout order.
    fn flag_fields(&self) -> [(&'static str, u8); 12] {
        [
            ("hypertension", self.hypertension),
            ("heart_disease", self.heart_disease),
            ("gender_Male", self.gender_male),
            ("gender_Other", self.gender_other),
            ("ever_married_Yes", self.ever_married_yes),
            ("Residence_type_Urban", self.residence_type_urban),
            (
                "smoking_status_never_smoked",
                self.smoking_status_never_smoked,
            ),
            ("smoking_status_smokes", self.smoking_status_smokes),
            ("work_type_Never_worked", self.work_type_never_worked),
            ("work_type_Private", self.work_type_private),
            ("work_type_Self_employed", self.work_type_self_employed),
            ("work_type_children", self.work_type_children),
        ]
    }

    /// Reject the first flag field outside {0,1}. Pure; no side effects.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.flag_fields() {
            if value > 1 {
                return Err(Error::schema_violation(
                    name,
                    format!("expected 0 or 1, got {value}"),
                ));
            }
        }
        Ok(())
    }

    /// Single feature row in the canonical layout order.
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.age,
            f64::from(self.hypertension),
            f64::from(self.heart_disease),
            self.avg_glucose_level,
            self.bmi,
            f64::from(self.gender_male),
            f64::from(self.gender_other),
            f64::from(self.ever_married_yes),
            f64::from(self.residence_type_urban),
            f64::from(self.smoking_status_never_smoked),
            f64::from(self.smoking_status_smokes),
            f64::from(self.work_type_never_worked),
            f64::from(self.work_type_private),
            f64::from(self.work_type_self_employed),
            f64::from(self.work_type_children),
        ]
    }

    /// Declared field names; delegates to the preprocessing layout so the
    /// schema can never drift from it.
    pub fn field_names() -> Vec<String> {
        preprocess::feature_names()
    }
}

//! Core data models for the stroke predictor

use serde::{Deserialize, Deserializer, Serialize};

/// One row of the raw stroke dataset, as read from CSV.
///
/// The `bmi` column carries the literal `N/A` for missing values; it
/// deserializes to `None` and such rows are dropped during preprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: u32,
    pub gender: String,
    pub age: f64,
    pub hypertension: u8,
    pub heart_disease: u8,
    pub ever_married: String,
    pub work_type: String,
    #[serde(rename = "Residence_type")]
    pub residence_type: String,
    pub avg_glucose_level: f64,
    #[serde(deserialize_with = "bmi_from_field")]
    pub bmi: Option<f64>,
    pub smoking_status: String,
    pub stroke: u8,
}

fn bmi_from_field<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Model-ready output of preprocessing: one feature row per surviving
/// record plus the label vector, with the feature names in layout order.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<u32>,
}

impl TrainingData {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Metadata persisted alongside a trained forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub accuracy: f64,
    pub max_depth: Option<u16>,
    pub n_trees: u16,
    pub trained_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmi_sentinel_deserializes_to_none() {
        let data = "\
id,gender,age,hypertension,heart_disease,ever_married,work_type,Residence_type,avg_glucose_level,bmi,smoking_status,stroke
1,Male,67,0,1,Yes,Private,Urban,228.69,N/A,formerly smoked,1
2,Female,61,0,0,Yes,Self-employed,Rural,202.21,28.1,never smoked,1
";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let records: Vec<RawRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bmi, None);
        assert_eq!(records[1].bmi, Some(28.1));
        assert_eq!(records[1].residence_type, "Rural");
    }
}

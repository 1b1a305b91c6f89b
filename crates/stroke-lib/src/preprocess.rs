//! Tabular preprocessing for the stroke dataset
//!
//! The single canonical transform from raw records to a model-ready
//! feature matrix. Training and serving both derive their feature layout
//! from the tables in this module; nothing else may redefine the column
//! list or the rename table.

use crate::error::{Error, Result};
use crate::models::{RawRecord, TrainingData};

/// Smoking-status sentinel; rows carrying it are dropped, never imputed.
pub const UNKNOWN_SMOKING_STATUS: &str = "Unknown";

/// Numeric columns passed through unchanged, in layout order.
pub const NUMERIC_FIELDS: [&str; 5] = [
    "age",
    "hypertension",
    "heart_disease",
    "avg_glucose_level",
    "bmi",
];

/// One-hot table for a categorical column.
///
/// The first category of each group is dropped, so K categories yield K-1
/// flag columns. `encoded` pairs each remaining raw value with its output
/// field name; the names already carry the two renames that turn
/// `Self-employed` and `never smoked` into valid identifiers.
pub struct CategoricalField {
    pub name: &'static str,
    pub dropped: &'static str,
    pub encoded: &'static [(&'static str, &'static str)],
    value: fn(&RawRecord) -> &str,
}

/// Categorical columns in encoding order.
pub const CATEGORICAL_FIELDS: [CategoricalField; 5] = [
    CategoricalField {
        name: "gender",
        dropped: "Female",
        encoded: &[("Male", "gender_Male"), ("Other", "gender_Other")],
        value: |r| &r.gender,
    },
    CategoricalField {
        name: "ever_married",
        dropped: "No",
        encoded: &[("Yes", "ever_married_Yes")],
        value: |r| &r.ever_married,
    },
    CategoricalField {
        name: "Residence_type",
        dropped: "Rural",
        encoded: &[("Urban", "Residence_type_Urban")],
        value: |r| &r.residence_type,
    },
    CategoricalField {
        name: "smoking_status",
        dropped: "formerly smoked",
        encoded: &[
            ("never smoked", "smoking_status_never_smoked"),
            ("smokes", "smoking_status_smokes"),
        ],
        value: |r| &r.smoking_status,
    },
    CategoricalField {
        name: "work_type",
        dropped: "Govt_job",
        encoded: &[
            ("Never_worked", "work_type_Never_worked"),
            ("Private", "work_type_Private"),
            ("Self-employed", "work_type_Self_employed"),
            ("children", "work_type_children"),
        ],
        value: |r| &r.work_type,
    },
];

/// Feature field names in layout order: numeric columns first, then the
/// one-hot groups in encoding order.
pub fn feature_names() -> Vec<String> {
    let mut names: Vec<String> = NUMERIC_FIELDS.iter().map(|n| n.to_string()).collect();
    for field in &CATEGORICAL_FIELDS {
        names.extend(field.encoded.iter().map(|(_, name)| name.to_string()));
    }
    names
}

/// Number of columns in the feature matrix.
pub fn feature_width() -> usize {
    NUMERIC_FIELDS.len()
        + CATEGORICAL_FIELDS
            .iter()
            .map(|f| f.encoded.len())
            .sum::<usize>()
}

/// Clean the raw records and encode them into a feature matrix plus label
/// vector.
///
/// Cleaning is a filter: rows with the `Unknown` smoking status or a
/// missing `bmi` are dropped entirely. The record identifier never enters
/// the matrix. Deterministic; the same input always yields the same layout
/// and values.
pub fn clean_and_encode(records: &[RawRecord]) -> Result<TrainingData> {
    let mut features = Vec::new();
    let mut labels = Vec::new();

    for record in records {
        if record.smoking_status == UNKNOWN_SMOKING_STATUS {
            continue;
        }
        let Some(bmi) = record.bmi else {
            continue;
        };
        features.push(encode_row(record, bmi)?);
        labels.push(u32::from(record.stroke));
    }

    if features.is_empty() {
        return Err(Error::dataset(
            "no usable rows after filtering unknown smoking status and missing bmi",
        ));
    }

    Ok(TrainingData {
        feature_names: feature_names(),
        features,
        labels,
    })
}

/// Encode one cleaned record into a feature row.
///
/// A categorical value that is neither the dropped reference category nor
/// in the encoding table would silently shift the layout, so it fails fast
/// instead.
fn encode_row(record: &RawRecord, bmi: f64) -> Result<Vec<f64>> {
    let mut row = Vec::with_capacity(feature_width());
    row.extend([
        record.age,
        f64::from(record.hypertension),
        f64::from(record.heart_disease),
        record.avg_glucose_level,
        bmi,
    ]);

    for field in &CATEGORICAL_FIELDS {
        let value = (field.value)(record);
        let mut known = value == field.dropped;
        for (raw, _) in field.encoded {
            if value == *raw {
                known = true;
                row.push(1.0);
            } else {
                row.push(0.0);
            }
        }
        if !known {
            return Err(Error::schema_violation(
                field.name,
                format!("unknown category `{value}` in record {}", record.id),
            ));
        }
    }

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        id: u32,
        gender: &str,
        smoking_status: &str,
        bmi: Option<f64>,
        stroke: u8,
    ) -> RawRecord {
        RawRecord {
            id,
            gender: gender.to_string(),
            age: 45.0,
            hypertension: 0,
            heart_disease: 0,
            ever_married: "Yes".to_string(),
            work_type: "Private".to_string(),
            residence_type: "Urban".to_string(),
            avg_glucose_level: 100.0,
            bmi,
            smoking_status: smoking_status.to_string(),
            stroke,
        }
    }

    #[test]
    fn drops_unknown_smoking_and_missing_bmi() {
        let records = vec![
            record(1, "Male", "Unknown", Some(25.0), 0),
            record(2, "Male", "smokes", None, 0),
            record(3, "Female", "smokes", Some(25.0), 1),
        ];
        let data = clean_and_encode(&records).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.labels, vec![1]);
    }

    #[test]
    fn deterministic_across_calls() {
        let records = vec![
            record(1, "Male", "smokes", Some(25.0), 0),
            record(2, "Female", "never smoked", Some(31.4), 1),
        ];
        let a = clean_and_encode(&records).unwrap();
        let b = clean_and_encode(&records).unwrap();
        assert_eq!(a.features, b.features);
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.feature_names, b.feature_names);
    }

    #[test]
    fn one_hot_arity_is_k_minus_one() {
        // 3 genders, 2 marital, 2 residence, 3 smoking (post-filter), 5 work
        // types: 2 + 1 + 1 + 2 + 4 dummy columns on top of 5 numeric ones.
        assert_eq!(feature_width(), 15);
        let names = feature_names();
        assert_eq!(names.len(), 15);
        for field in &CATEGORICAL_FIELDS {
            let dropped_name = format!("{}_{}", field.name, field.dropped);
            assert!(!names.contains(&dropped_name), "{dropped_name} present");
        }
    }

    #[test]
    fn renames_produce_valid_identifiers() {
        let names = feature_names();
        assert!(!names.iter().any(|n| n == "work_type_Self-employed"));
        assert!(!names.iter().any(|n| n == "smoking_status_never smoked"));
        assert!(names.iter().any(|n| n == "work_type_Self_employed"));
        assert!(names.iter().any(|n| n == "smoking_status_never_smoked"));
    }

    #[test]
    fn unknown_category_fails_fast() {
        let records = vec![record(7, "Unspecified", "smokes", Some(25.0), 0)];
        let err = clean_and_encode(&records).unwrap_err();
        match err {
            Error::SchemaViolation { field, reason } => {
                assert_eq!(field, "gender");
                assert!(reason.contains("Unspecified"));
                assert!(reason.contains('7'));
            }
            other => panic!("expected SchemaViolation, got {other}"),
        }
    }

    #[test]
    fn example_record_encodes_as_documented() {
        let example = RawRecord {
            id: 9046,
            gender: "Male".to_string(),
            age: 67.0,
            hypertension: 0,
            heart_disease: 1,
            ever_married: "Yes".to_string(),
            work_type: "Private".to_string(),
            residence_type: "Urban".to_string(),
            avg_glucose_level: 228.69,
            bmi: Some(36.6),
            smoking_status: "formerly smoked".to_string(),
            stroke: 1,
        };
        let data = clean_and_encode(std::slice::from_ref(&example)).unwrap();
        assert_eq!(data.len(), 1);

        let row = &data.features[0];
        let names = &data.feature_names;
        let get = |name: &str| row[names.iter().position(|n| n == name).unwrap()];

        assert_eq!(get("gender_Male"), 1.0);
        assert_eq!(get("ever_married_Yes"), 1.0);
        assert_eq!(get("Residence_type_Urban"), 1.0);
        assert_eq!(get("work_type_Private"), 1.0);
        // "formerly smoked" is the dropped reference category.
        assert_eq!(get("smoking_status_never_smoked"), 0.0);
        assert_eq!(get("smoking_status_smokes"), 0.0);
        assert_eq!(get("age"), 67.0);
        assert_eq!(get("bmi"), 36.6);
        assert_eq!(data.labels, vec![1]);
    }
}

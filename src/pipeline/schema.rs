//! Column roles for the merged travel + survey table

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ID_COLUMN: &str = "ID";
pub const DEFAULT_LABEL_COLUMN: &str = "Overall_Experience";
pub const ARRIVAL_DELAY: &str = "Arrival_Delay_in_Mins";
pub const DEPARTURE_DELAY: &str = "Departure_Delay_in_Mins";

/// Role a column plays in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Identifier,
    Label,
    Categorical,
    Numeric,
}

/// `target` is filled from the same row's `source` after direct imputation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedFill {
    pub target: String,
    pub source: String,
}

/// Static classification of every column the pipeline reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub id: String,
    pub label: String,
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
    pub derived_fills: Vec<DerivedFill>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl FeatureSchema {
    /// Layout of the Traveldata + Surveydata files
    pub fn travel_survey() -> Self {
        Self {
            id: DEFAULT_ID_COLUMN.to_string(),
            label: DEFAULT_LABEL_COLUMN.to_string(),
            categorical: owned(&[
                "Gender",
                "Customer_Type",
                "Type_Travel",
                "Travel_Class",
                "Seat_Comfort",
                "Seat_Class",
                "Arrival_Time_Convenient",
                "Catering",
                "Platform_Location",
                "Onboard_Wifi_Service",
                "Onboard_Entertainment",
                "Online_Support",
                "Ease_of_Online_Booking",
                "Onboard_Service",
                "Legroom",
                "Baggage_Handling",
                "CheckIn_Service",
                "Cleanliness",
                "Online_Boarding",
            ]),
            numeric: owned(&["Age", "Travel_Distance", DEPARTURE_DELAY, ARRIVAL_DELAY]),
            derived_fills: vec![DerivedFill {
                target: ARRIVAL_DELAY.to_string(),
                source: DEPARTURE_DELAY.to_string(),
            }],
        }
    }

    /// Classify columns by dtype: text and boolean columns are categorical,
    /// integer and float columns numeric.
    pub fn infer(df: &DataFrame, id: &str, label: &str) -> Result<Self> {
        let mut categorical = Vec::new();
        let mut numeric = Vec::new();

        for column in df.get_columns() {
            let name = column.name().as_str();
            if name == id || name == label {
                continue;
            }
            let dtype = column.dtype();
            if matches!(dtype, DataType::String | DataType::Boolean | DataType::Categorical(..)) {
                categorical.push(name.to_string());
            } else if dtype.is_integer() || dtype.is_float() {
                numeric.push(name.to_string());
            } else {
                anyhow::bail!(
                    "Cannot infer a role for column '{}' with type {}",
                    name,
                    dtype
                );
            }
        }

        let mut derived_fills = Vec::new();
        if numeric.iter().any(|n| n == ARRIVAL_DELAY) && numeric.iter().any(|n| n == DEPARTURE_DELAY) {
            derived_fills.push(DerivedFill {
                target: ARRIVAL_DELAY.to_string(),
                source: DEPARTURE_DELAY.to_string(),
            });
        }

        Ok(Self {
            id: id.to_string(),
            label: label.to_string(),
            categorical,
            numeric,
            derived_fills,
        })
    }

    /// Check that every column the schema names exists in `df` and that
    /// numeric columns were read with a numeric type
    pub fn validate(&self, df: &DataFrame, require_label: bool) -> Result<()> {
        let present: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        let mut missing: Vec<&str> = std::iter::once(self.id.as_str())
            .chain(self.categorical.iter().map(|s| s.as_str()))
            .chain(self.numeric.iter().map(|s| s.as_str()))
            .filter(|name| !present.contains(name))
            .collect();
        if require_label && !present.contains(&self.label.as_str()) {
            missing.push(self.label.as_str());
        }

        if !missing.is_empty() {
            anyhow::bail!(
                "Missing required column(s): {}. Available columns: {:?}",
                missing.join(", "),
                present
            );
        }

        for name in &self.numeric {
            let column = df.column(name)?;
            let dtype = column.dtype();
            let all_null = column.null_count() == column.len();
            if !(dtype.is_integer() || dtype.is_float() || all_null) {
                anyhow::bail!(
                    "Numeric column '{}' was read as {}; expected integers or floats",
                    name,
                    dtype
                );
            }
        }

        for fill in &self.derived_fills {
            if self.role_of(&fill.target) != Some(ColumnRole::Numeric)
                || self.role_of(&fill.source) != Some(ColumnRole::Numeric)
            {
                anyhow::bail!(
                    "Derived fill {} <- {} must reference numeric columns",
                    fill.target,
                    fill.source
                );
            }
        }
        Ok(())
    }

    pub fn role_of(&self, name: &str) -> Option<ColumnRole> {
        if name == self.id {
            Some(ColumnRole::Identifier)
        } else if name == self.label {
            Some(ColumnRole::Label)
        } else if self.categorical.iter().any(|c| c == name) {
            Some(ColumnRole::Categorical)
        } else if self.numeric.iter().any(|c| c == name) {
            Some(ColumnRole::Numeric)
        } else {
            None
        }
    }

    /// Categorical then numeric column names
    pub fn feature_columns(&self) -> impl Iterator<Item = &str> {
        self.categorical
            .iter()
            .chain(self.numeric.iter())
            .map(|s| s.as_str())
    }

    pub fn is_derived(&self, name: &str) -> bool {
        self.derived_fills.iter().any(|f| f.target == name)
    }
}

/// Read the label column as 0/1 floats, rejecting nulls and other values
pub fn binary_labels(df: &DataFrame, label: &str) -> Result<Vec<f64>> {
    let column = df
        .column(label)
        .with_context(|| format!("Label column '{}' not found", label))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Label column '{}' is not numeric", label))?;
    let values = column.f64()?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(x) if x == 0.0 || x == 1.0 => Ok(x),
            Some(x) => anyhow::bail!("Label '{}' has non-binary value {} at row {}", label, x, row),
            None => anyhow::bail!("Label '{}' is missing at row {}", label, row),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_survey_roles() {
        let schema = FeatureSchema::travel_survey();
        assert_eq!(schema.categorical.len(), 19);
        assert_eq!(schema.numeric.len(), 4);
        assert_eq!(schema.role_of("ID"), Some(ColumnRole::Identifier));
        assert_eq!(schema.role_of("Overall_Experience"), Some(ColumnRole::Label));
        assert_eq!(schema.role_of("Seat_Comfort"), Some(ColumnRole::Categorical));
        assert_eq!(schema.role_of("Age"), Some(ColumnRole::Numeric));
        assert_eq!(schema.role_of("Nope"), None);
        assert!(schema.is_derived(ARRIVAL_DELAY));
    }

    #[test]
    fn test_infer_from_dtypes() {
        let df = df! {
            "ID" => [1i64, 2, 3],
            "Gender" => ["Male", "Female", "Male"],
            "Age" => [Some(30.0f64), None, Some(50.0)],
            "Departure_Delay_in_Mins" => [0i64, 5, 10],
            "Arrival_Delay_in_Mins" => [Some(0i64), Some(4), None],
            "Overall_Experience" => [1i64, 0, 1],
        }
        .unwrap();

        let schema = FeatureSchema::infer(&df, "ID", "Overall_Experience").unwrap();
        assert_eq!(schema.categorical, vec!["Gender"]);
        assert_eq!(
            schema.numeric,
            vec!["Age", "Departure_Delay_in_Mins", "Arrival_Delay_in_Mins"]
        );
        assert_eq!(schema.derived_fills.len(), 1);
        schema.validate(&df, true).unwrap();
    }

    #[test]
    fn test_validate_reports_missing_columns() {
        let df = df! {
            "ID" => [1i64],
            "Gender" => ["Male"],
        }
        .unwrap();
        let err = FeatureSchema::travel_survey()
            .validate(&df, false)
            .unwrap_err()
            .to_string();
        assert!(err.contains("Seat_Comfort"));
        assert!(!err.contains("Overall_Experience"));
    }

    #[test]
    fn test_validate_rejects_text_in_numeric_column() {
        let schema = FeatureSchema {
            id: "ID".to_string(),
            label: "y".to_string(),
            categorical: vec!["Gender".to_string()],
            numeric: vec!["Age".to_string(), "Empty".to_string()],
            derived_fills: Vec::new(),
        };

        let ok = df! {
            "ID" => [1i64, 2],
            "Gender" => ["Male", "Female"],
            "Age" => [30i64, 41],
            "Empty" => [None::<&str>, None],
        }
        .unwrap();
        schema.validate(&ok, false).unwrap();

        let bad = df! {
            "ID" => [1i64, 2],
            "Gender" => ["Male", "Female"],
            "Age" => ["30", "forty"],
            "Empty" => [None::<&str>, None],
        }
        .unwrap();
        let err = schema.validate(&bad, false).unwrap_err().to_string();
        assert!(err.contains("'Age'"), "{}", err);
    }

    #[test]
    fn test_binary_labels_rejects_other_values() {
        let ok = df! { "y" => [0i32, 1, 1] }.unwrap();
        assert_eq!(binary_labels(&ok, "y").unwrap(), vec![0.0, 1.0, 1.0]);

        let bad = df! { "y" => [0i32, 2] }.unwrap();
        assert!(binary_labels(&bad, "y").is_err());

        let null = df! { "y" => [Some(0i32), None] }.unwrap();
        assert!(binary_labels(&null, "y").is_err());
    }
}

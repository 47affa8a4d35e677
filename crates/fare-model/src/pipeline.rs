//! Preprocessing plus regression as one fitted unit.

use crate::error::{ModelError, Result};
use crate::preprocessing::{OneHotEncoder, StandardScaler};
use crate::regression::LinearRegression;
use fare_features::FeatureConfig;
use ndarray::{Array1, Array2, Axis, concatenate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A single input value of a prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Numeric value
    Number(f64),
    /// Categorical label
    Text(String),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // integral numbers print the way an integer column casts to string
            Self::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// One prediction request keyed by feature name.
pub type Record = BTreeMap<String, FeatureValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Fitted {
    scaler: StandardScaler,
    encoder: OneHotEncoder,
    regression: LinearRegression,
}

/// Standard scaling of numeric features, one-hot encoding of categorical
/// features, then linear regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarePipeline {
    num_features: Vec<String>,
    cat_features: Vec<String>,
    fitted: Option<Fitted>,
}

impl FarePipeline {
    /// Create an unfitted pipeline over the given input columns.
    pub const fn new(num_features: Vec<String>, cat_features: Vec<String>) -> Self {
        Self {
            num_features,
            cat_features,
            fitted: None,
        }
    }

    /// Create an unfitted pipeline over the inputs of a feature selection.
    pub fn from_feature_config(config: &FeatureConfig) -> Self {
        Self::new(config.num_features.clone(), config.cat_features.clone())
    }

    /// Numeric input columns.
    pub fn num_features(&self) -> &[String] {
        &self.num_features
    }

    /// Categorical input columns.
    pub fn cat_features(&self) -> &[String] {
        &self.cat_features
    }

    /// Whether `fit` has run.
    pub const fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fitted regression, if any.
    pub fn regression(&self) -> Option<&LinearRegression> {
        self.fitted.as_ref().map(|f| &f.regression)
    }

    /// Names of the encoded design columns, numeric first.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.num_features.clone();
        if let Some(fitted) = &self.fitted {
            names.extend(fitted.encoder.feature_names());
        }
        names
    }

    /// Fit preprocessing and regression on `x` against `y`.
    pub fn fit(&mut self, x: &DataFrame, y: &[f64]) -> Result<()> {
        if x.height() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if y.len() != x.height() {
            return Err(ModelError::DimensionMismatch {
                expected: x.height(),
                actual: y.len(),
            });
        }

        let scaler = StandardScaler::fit(x, &self.num_features)?;
        let encoder = OneHotEncoder::fit(x, &self.cat_features)?;
        let design = design_matrix(scaler.transform(x)?, encoder.transform(x)?)?;
        let regression = LinearRegression::fit(&design, &Array1::from(y.to_vec()))?;

        self.fitted = Some(Fitted {
            scaler,
            encoder,
            regression,
        });
        Ok(())
    }

    /// Predict one fare per row of `x`.
    pub fn predict(&self, x: &DataFrame) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        let design = design_matrix(fitted.scaler.transform(x)?, fitted.encoder.transform(x)?)?;
        Ok(fitted.regression.predict(&design)?.to_vec())
    }

    /// Predict the fare of a single record.
    pub fn predict_one(&self, record: &Record) -> Result<f64> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;

        let numeric = self
            .num_features
            .iter()
            .map(|name| match record.get(name) {
                Some(FeatureValue::Number(v)) => Ok(*v),
                Some(FeatureValue::Text(s)) => Err(ModelError::NonNumeric {
                    column: name.clone(),
                    reason: format!("got text {s:?}"),
                }),
                None => Err(ModelError::MissingColumn(name.clone())),
            })
            .collect::<Result<Vec<f64>>>()?;

        let categorical = self
            .cat_features
            .iter()
            .map(|name| {
                record
                    .get(name)
                    .map(|v| Some(v.to_string()))
                    .ok_or_else(|| ModelError::MissingColumn(name.clone()))
            })
            .collect::<Result<Vec<Option<String>>>>()?;

        let mut row = fitted.scaler.transform_row(&numeric)?;
        row.extend(fitted.encoder.transform_row(&categorical)?);
        let design = Array2::from_shape_vec((1, row.len()), row)
            .map_err(|e| ModelError::InvalidState(e.to_string()))?;

        Ok(fitted.regression.predict(&design)?[0])
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the pipeline as JSON to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a pipeline written by [`FarePipeline::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

fn design_matrix(numeric: Array2<f64>, categorical: Array2<f64>) -> Result<Array2<f64>> {
    concatenate(Axis(1), &[numeric.view(), categorical.view()]).map_err(|_| {
        ModelError::DimensionMismatch {
            expected: numeric.nrows(),
            actual: categorical.nrows(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn pipeline() -> FarePipeline {
        FarePipeline::new(vec!["distance".into()], vec!["vendor_id".into()])
    }

    fn training() -> (DataFrame, Vec<f64>) {
        // fare = 2 * distance + 3, plus 1 for vendor 2
        let x = df!(
            "distance" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            "vendor_id" => ["1", "2", "1", "2", "1", "2"],
        )
        .unwrap();
        let y = vec![5.0, 8.0, 9.0, 12.0, 13.0, 16.0];
        (x, y)
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _) = training();
        assert!(matches!(pipeline().predict(&x), Err(ModelError::NotFitted)));
    }

    #[test]
    fn test_fit_recovers_linear_fares() {
        let (x, y) = training();
        let mut pipe = pipeline();
        pipe.fit(&x, &y).unwrap();

        for (pred, truth) in pipe.predict(&x).unwrap().iter().zip(&y) {
            assert_abs_diff_eq!(pred, truth, epsilon = 1e-8);
        }
        assert_eq!(pipe.feature_names(), vec!["distance", "vendor_id_1", "vendor_id_2"]);
    }

    #[test]
    fn test_predict_one_matches_batch() {
        let (x, y) = training();
        let mut pipe = pipeline();
        pipe.fit(&x, &y).unwrap();

        let record = Record::from([
            ("distance".to_string(), FeatureValue::from(10.0)),
            ("vendor_id".to_string(), FeatureValue::from(2i64)),
        ]);
        assert_abs_diff_eq!(pipe.predict_one(&record).unwrap(), 24.0, epsilon = 1e-8);
    }

    #[test]
    fn test_predict_one_missing_feature() {
        let (x, y) = training();
        let mut pipe = pipeline();
        pipe.fit(&x, &y).unwrap();

        let record = Record::from([("distance".to_string(), FeatureValue::from(1.0))]);
        let err = pipe.predict_one(&record).unwrap_err();
        assert!(matches!(err, ModelError::MissingColumn(c) if c == "vendor_id"));
    }

    #[test]
    fn test_json_round_trip_predicts_identically() {
        let (x, y) = training();
        let mut pipe = pipeline();
        pipe.fit(&x, &y).unwrap();

        let restored = FarePipeline::from_json(&pipe.to_json().unwrap()).unwrap();
        assert!(restored.is_fitted());
        let before = pipe.predict(&x).unwrap();
        let after = restored.predict(&x).unwrap();
        for (a, b) in before.iter().zip(&after) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_feature_value_display() {
        assert_eq!(FeatureValue::from(2i64).to_string(), "2");
        assert_eq!(FeatureValue::from(2.5).to_string(), "2.5");
        assert_eq!(FeatureValue::from("CMT").to_string(), "CMT");
    }
}

//! Feature selection injected into the transformer.

use serde::{Deserialize, Serialize};

/// Names of the columns that survive the transformation.
///
/// Built from the project configuration; the transformer projects its output
/// to `num_features ++ cat_features ++ target`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Numeric model inputs
    pub num_features: Vec<String>,
    /// Categorical model inputs
    #[serde(default)]
    pub cat_features: Vec<String>,
    /// Regression target(s)
    pub target: Vec<String>,
}

impl FeatureConfig {
    /// Create a feature configuration.
    pub const fn new(
        num_features: Vec<String>,
        cat_features: Vec<String>,
        target: Vec<String>,
    ) -> Self {
        Self {
            num_features,
            cat_features,
            target,
        }
    }

    /// Model input columns, numeric first.
    pub fn input_columns(&self) -> Vec<&str> {
        dedup(self.num_features.iter().chain(&self.cat_features))
    }

    /// Every retained column in projection order, without repeats.
    pub fn selected_columns(&self) -> Vec<&str> {
        dedup(
            self.num_features
                .iter()
                .chain(&self.cat_features)
                .chain(&self.target),
        )
    }
}

fn dedup<'a>(names: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for name in names {
        if !out.contains(&name.as_str()) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FeatureConfig {
        FeatureConfig::new(
            vec!["passenger_count".into(), "mean_distance".into()],
            vec!["vendor_id".into()],
            vec!["fare_amount".into()],
        )
    }

    #[test]
    fn test_selected_columns_order() {
        assert_eq!(
            config().selected_columns(),
            vec!["passenger_count", "mean_distance", "vendor_id", "fare_amount"]
        );
    }

    #[test]
    fn test_input_columns_exclude_target() {
        assert_eq!(
            config().input_columns(),
            vec!["passenger_count", "mean_distance", "vendor_id"]
        );
    }

    #[test]
    fn test_repeated_names_kept_once() {
        let config = FeatureConfig::new(
            vec!["fare_amount".into()],
            vec![],
            vec!["fare_amount".into()],
        );
        assert_eq!(config.selected_columns(), vec!["fare_amount"]);
    }
}

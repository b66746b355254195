use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Standardization parameters fitted for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

impl NumericColumn {
    /// Constant columns were fitted with a zero scale; they pass through centred but unscaled.
    pub(crate) fn standardize(&self, value: f64) -> f64 {
        let scale = if self.scale.is_finite() && self.scale != 0.0 {
            self.scale
        } else {
            1.0
        };
        (value - self.mean) / scale
    }
}

/// One-hot vocabulary fitted for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

impl CategoricalColumn {
    pub(crate) fn position(&self, value: &str) -> Option<usize> {
        self.categories.iter().position(|category| category == value)
    }
}

/// Fitted preprocessing parameters: numeric columns first, then one-hot blocks, in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSchema {
    #[serde(default)]
    pub numeric: Vec<NumericColumn>,
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
}

impl FeatureSchema {
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|column| column.categories.len())
                .sum::<usize>()
    }

    /// Checks the fitted parameters are usable; the message names the offending column.
    pub fn validate(&self) -> Result<(), String> {
        if self.width() == 0 {
            return Err("feature schema declares no columns".to_string());
        }

        let mut names = HashSet::new();
        for name in self
            .numeric
            .iter()
            .map(|column| &column.name)
            .chain(self.categorical.iter().map(|column| &column.name))
        {
            if name.trim().is_empty() {
                return Err("feature schema contains an unnamed column".to_string());
            }
            if !names.insert(name.as_str()) {
                return Err(format!("feature column '{name}' is declared twice"));
            }
        }

        for column in &self.numeric {
            if !column.mean.is_finite() {
                return Err(format!("numeric column '{}' has a non-finite mean", column.name));
            }
        }

        for column in &self.categorical {
            if column.categories.is_empty() {
                return Err(format!(
                    "categorical column '{}' has no fitted categories",
                    column.name
                ));
            }
            let unique: HashSet<&str> = column.categories.iter().map(String::as_str).collect();
            if unique.len() != column.categories.len() {
                return Err(format!(
                    "categorical column '{}' repeats a category",
                    column.name
                ));
            }
        }

        Ok(())
    }
}

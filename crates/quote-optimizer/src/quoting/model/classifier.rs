use serde::{Deserialize, Serialize};

pub(crate) fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

/// Trained binary classifier parameters as exported by the training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    Logistic(LogisticModel),
    TreeEnsemble(TreeEnsemble),
}

impl Classifier {
    /// Raw log-odds for one feature row. The caller guarantees the row width.
    pub(crate) fn margin(&self, row: &[f64]) -> f64 {
        match self {
            Classifier::Logistic(model) => model.margin(row),
            Classifier::TreeEnsemble(model) => model.margin(row),
        }
    }

    pub(crate) fn validate(&self, width: usize) -> Result<(), String> {
        match self {
            Classifier::Logistic(model) => model.validate(width),
            Classifier::TreeEnsemble(model) => model.validate(width),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LogisticModel {
    fn margin(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(weight, value)| weight * value)
                .sum::<f64>()
    }

    fn validate(&self, width: usize) -> Result<(), String> {
        if self.coefficients.len() != width {
            return Err(format!(
                "logistic model has {} coefficients but the feature schema is {} wide",
                self.coefficients.len(),
                width
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err("logistic model contains non-finite weights".to_string());
        }
        Ok(())
    }
}

/// Gradient-boosted decision trees summed in log-odds space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_margin: f64,
    pub trees: Vec<RegressionTree>,
}

impl TreeEnsemble {
    fn margin(&self, row: &[f64]) -> f64 {
        self.base_margin + self.trees.iter().map(|tree| tree.leaf(row)).sum::<f64>()
    }

    fn validate(&self, width: usize) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("tree ensemble contains no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(width)
                .map_err(|reason| format!("tree {idx}: {reason}"))?;
        }
        Ok(())
    }
}

/// Flat node array rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        default_left: bool,
    },
    Leaf {
        value: f64,
    },
}

impl RegressionTree {
    /// Children always sit after their parent, so the walk ends within `nodes.len()` steps.
    fn leaf(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let value = row[*feature];
                    let go_left = if value.is_finite() {
                        value < *threshold
                    } else {
                        *default_left
                    };
                    idx = if go_left { *left } else { *right };
                }
            }
        }
    }

    fn validate(&self, width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } if !value.is_finite() => {
                    return Err(format!("leaf {idx} has a non-finite value"));
                }
                TreeNode::Leaf { .. } => {}
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= width {
                        return Err(format!(
                            "node {idx} splits on feature {feature} but the schema is {width} wide"
                        ));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} points at invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

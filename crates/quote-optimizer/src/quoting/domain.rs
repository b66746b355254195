use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Product families the print catalogue quotes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductType {
    Flyer,
    Poster,
    TShirt,
}

impl ProductType {
    /// Category label used by the fitted encoders.
    pub fn label(&self) -> &'static str {
        match self {
            ProductType::Flyer => "flyer",
            ProductType::Poster => "poster",
            ProductType::TShirt => "t-shirt",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Buyer requirement record produced by the RFQ intake step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rfq {
    pub client_id: String,
    pub region: String,
    pub product_type: ProductType,
    pub quantity: u32,
    pub deadline: NaiveDate,
}

/// Free-form offer attribute consumed by the feature schema (e.g. supplier tier, on-time rate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

/// Candidate supplier proposal against an RFQ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub supplier_id: String,
    pub unit_price: f64,
    #[serde(alias = "quoted_margin_pct")]
    pub margin: f64,
    pub lead_time_days: u32,
    #[serde(default, flatten)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Offer {
    pub fn new(
        supplier_id: impl Into<String>,
        unit_price: f64,
        margin: f64,
        lead_time_days: u32,
    ) -> Self {
        Self {
            supplier_id: supplier_id.into(),
            unit_price,
            margin,
            lead_time_days,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// An offer paired with its predicted win probability and expected value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredOffer {
    offer: Offer,
    p_win: f64,
    objective_value: f64,
}

impl ScoredOffer {
    /// `p_win` is clamped to `[0, 1]`; the objective is `p_win * margin`.
    pub fn new(offer: Offer, p_win: f64) -> Self {
        let p_win = if p_win.is_finite() {
            p_win.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let objective_value = p_win * offer.margin;
        Self {
            offer,
            p_win,
            objective_value,
        }
    }

    pub fn offer(&self) -> &Offer {
        &self.offer
    }

    pub fn supplier_id(&self) -> &str {
        &self.offer.supplier_id
    }

    pub fn margin(&self) -> f64 {
        self.offer.margin
    }

    pub fn p_win(&self) -> f64 {
        self.p_win
    }

    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }
}

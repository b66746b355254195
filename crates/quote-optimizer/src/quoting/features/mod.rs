mod columns;
mod schema;

pub use schema::{CategoricalColumn, FeatureSchema, NumericColumn};

use super::domain::{Offer, Rfq};
use columns::{resolve, ColumnValue, OfferSetContext};
use serde::Serialize;
use tracing::warn;

/// Encoded features for one offer, in schema column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One feature vector per offer, in the order the offers were supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix {
    width: usize,
    rows: Vec<FeatureVector>,
}

impl FeatureMatrix {
    pub fn new(width: usize, rows: Vec<FeatureVector>) -> Self {
        Self { width, rows }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Raised when an RFQ or offer cannot be encoded. Any such offer fails the whole request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("rfq for client {client_id} must request a positive quantity")]
    InvalidQuantity { client_id: String },
    #[error("offer {supplier_id} is missing required attribute '{attribute}'")]
    MissingAttribute {
        supplier_id: String,
        attribute: String,
    },
    #[error("offer {supplier_id} attribute '{attribute}' must be {expected}")]
    WrongType {
        supplier_id: String,
        attribute: String,
        expected: &'static str,
    },
    #[error("offer {supplier_id} attribute '{attribute}' is out of range ({value}): {reason}")]
    OutOfRange {
        supplier_id: String,
        attribute: String,
        value: f64,
        reason: &'static str,
    },
}

impl SchemaError {
    /// Supplier whose offer was rejected, when the failure is offer-specific.
    pub fn supplier_id(&self) -> Option<&str> {
        match self {
            SchemaError::InvalidQuantity { .. } => None,
            SchemaError::MissingAttribute { supplier_id, .. }
            | SchemaError::WrongType { supplier_id, .. }
            | SchemaError::OutOfRange { supplier_id, .. } => Some(supplier_id),
        }
    }
}

/// Stateless transform from an RFQ and its offers into model inputs, driven by fitted parameters.
///
/// Categorical values the encoder never saw during fitting land in an all-zero bucket and are
/// logged; they never fail the request.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    schema: FeatureSchema,
}

impl FeaturePipeline {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn width(&self) -> usize {
        self.schema.width()
    }

    pub fn transform(&self, rfq: &Rfq, offers: &[Offer]) -> Result<FeatureMatrix, SchemaError> {
        if rfq.quantity == 0 {
            return Err(SchemaError::InvalidQuantity {
                client_id: rfq.client_id.clone(),
            });
        }
        for offer in offers {
            check_offer(offer)?;
        }

        let context = OfferSetContext::from_offers(offers);
        let rows = offers
            .iter()
            .map(|offer| self.encode(rfq, offer, &context))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeatureMatrix::new(self.width(), rows))
    }

    fn encode(
        &self,
        rfq: &Rfq,
        offer: &Offer,
        context: &OfferSetContext,
    ) -> Result<FeatureVector, SchemaError> {
        let mut values = Vec::with_capacity(self.width());

        for column in &self.schema.numeric {
            match resolve(&column.name, rfq, offer, context) {
                Some(ColumnValue::Number(value)) if value.is_finite() => {
                    values.push(column.standardize(value));
                }
                Some(ColumnValue::Number(value)) => {
                    return Err(SchemaError::OutOfRange {
                        supplier_id: offer.supplier_id.clone(),
                        attribute: column.name.clone(),
                        value,
                        reason: "value must be finite",
                    });
                }
                Some(ColumnValue::Text(_)) => {
                    return Err(wrong_type(offer, &column.name, "numeric"));
                }
                None => return Err(missing(offer, &column.name)),
            }
        }

        for column in &self.schema.categorical {
            let label = match resolve(&column.name, rfq, offer, context) {
                Some(ColumnValue::Text(label)) => label,
                Some(ColumnValue::Number(_)) => {
                    return Err(wrong_type(offer, &column.name, "a category label"));
                }
                None => return Err(missing(offer, &column.name)),
            };

            let hot = column.position(label);
            if hot.is_none() {
                warn!(
                    supplier_id = %offer.supplier_id,
                    column = %column.name,
                    value = %label,
                    "unseen category encoded as unknown"
                );
            }
            values.extend((0..column.categories.len()).map(|idx| {
                if Some(idx) == hot {
                    1.0
                } else {
                    0.0
                }
            }));
        }

        Ok(FeatureVector::new(values))
    }
}

fn check_offer(offer: &Offer) -> Result<(), SchemaError> {
    if !offer.unit_price.is_finite() || offer.unit_price <= 0.0 {
        return Err(SchemaError::OutOfRange {
            supplier_id: offer.supplier_id.clone(),
            attribute: "unit_price".to_string(),
            value: offer.unit_price,
            reason: "unit price must be positive",
        });
    }
    if !(0.0..=1.0).contains(&offer.margin) {
        return Err(SchemaError::OutOfRange {
            supplier_id: offer.supplier_id.clone(),
            attribute: "margin".to_string(),
            value: offer.margin,
            reason: "margin must be a fraction between 0 and 1",
        });
    }
    Ok(())
}

fn missing(offer: &Offer, attribute: &str) -> SchemaError {
    SchemaError::MissingAttribute {
        supplier_id: offer.supplier_id.clone(),
        attribute: attribute.to_string(),
    }
}

fn wrong_type(offer: &Offer, attribute: &str, expected: &'static str) -> SchemaError {
    SchemaError::WrongType {
        supplier_id: offer.supplier_id.clone(),
        attribute: attribute.to_string(),
        expected,
    }
}

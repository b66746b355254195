use super::super::domain::{AttributeValue, Offer, Rfq};

/// Value of a named column for one offer, before encoding.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ColumnValue<'a> {
    Number(f64),
    Text(&'a str),
}

/// Per-request aggregates the relative columns are computed against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OfferSetContext {
    min_unit_price: f64,
    min_lead_time_days: u32,
}

impl OfferSetContext {
    pub(crate) fn from_offers(offers: &[Offer]) -> Self {
        let min_unit_price = offers
            .iter()
            .map(|offer| offer.unit_price)
            .fold(f64::INFINITY, f64::min);
        let min_lead_time_days = offers
            .iter()
            .map(|offer| offer.lead_time_days)
            .min()
            .unwrap_or(0);

        Self {
            min_unit_price,
            min_lead_time_days,
        }
    }
}

/// Looks a column up on the RFQ, the offer's own fields, the derived columns and finally the
/// offer's attribute map.
pub(crate) fn resolve<'a>(
    name: &str,
    rfq: &'a Rfq,
    offer: &'a Offer,
    context: &OfferSetContext,
) -> Option<ColumnValue<'a>> {
    let value = match name {
        "client_id" => ColumnValue::Text(&rfq.client_id),
        "region" => ColumnValue::Text(&rfq.region),
        "product_type" => ColumnValue::Text(rfq.product_type.label()),
        "quantity" => ColumnValue::Number(f64::from(rfq.quantity)),
        "quantity_log" => ColumnValue::Number(f64::from(rfq.quantity).ln_1p()),
        "supplier_id" => ColumnValue::Text(&offer.supplier_id),
        "unit_price" => ColumnValue::Number(offer.unit_price),
        "margin" | "quoted_margin_pct" => ColumnValue::Number(offer.margin),
        "lead_time_days" => ColumnValue::Number(f64::from(offer.lead_time_days)),
        "price_delta_pct" => {
            ColumnValue::Number(offer.unit_price / context.min_unit_price - 1.0)
        }
        "lead_delta_days" => ColumnValue::Number(f64::from(
            offer.lead_time_days - context.min_lead_time_days,
        )),
        other => match offer.attributes.get(other)? {
            AttributeValue::Number(number) => ColumnValue::Number(*number),
            AttributeValue::Text(text) => ColumnValue::Text(text),
        },
    };

    Some(value)
}

use std::io::Write;

use serde::{Deserialize, Serialize};

use super::domain::ScoredOffer;
use super::optimizer::{rank_order, Selection};

/// One line of the ranked offer table handed to presentation and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub rank: usize,
    pub supplier_id: String,
    pub unit_price: f64,
    pub margin: f64,
    pub p_win: f64,
    pub objective_value: f64,
    pub lead_time_days: u32,
    pub is_selected: bool,
}

/// Scored offers ordered by expected value, best first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedTable {
    rows: Vec<RankedRow>,
}

impl RankedTable {
    pub fn rows(&self) -> &[RankedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn selected(&self) -> Option<&RankedRow> {
        self.rows.iter().find(|row| row.is_selected)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Orders every scored offer with the selection tie-break and flags the selected one.
pub fn format(scored_offers: &[ScoredOffer], selection: Option<&Selection>) -> RankedTable {
    let mut order: Vec<usize> = (0..scored_offers.len()).collect();
    order.sort_by(|&left, &right| {
        rank_order(&scored_offers[left], left, &scored_offers[right], right)
    });

    let selected_index = selection.map(|selection| selection.index);
    let rows = order
        .into_iter()
        .enumerate()
        .map(|(position, idx)| {
            let scored = &scored_offers[idx];
            let offer = scored.offer();
            RankedRow {
                rank: position + 1,
                supplier_id: offer.supplier_id.clone(),
                unit_price: offer.unit_price,
                margin: offer.margin,
                p_win: scored.p_win(),
                objective_value: scored.objective_value(),
                lead_time_days: offer.lead_time_days,
                is_selected: selected_index == Some(idx),
            }
        })
        .collect();

    RankedTable { rows }
}

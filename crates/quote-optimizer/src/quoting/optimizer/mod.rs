mod program;

pub(crate) use program::rank_order;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{Rfq, ScoredOffer};
use program::{Constraint, SelectionProgram};

/// Offers must be delivered `order_date + lead_time_days <= deadline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWindow {
    pub order_date: NaiveDate,
    pub deadline: NaiveDate,
}

/// Feasibility rules applied before maximizing expected value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionConstraints {
    pub margin_floor: f64,
    #[serde(default)]
    pub delivery_window: Option<DeliveryWindow>,
}

impl SelectionConstraints {
    pub fn new(margin_floor: f64) -> Self {
        Self {
            margin_floor,
            delivery_window: None,
        }
    }

    pub fn delivered_by(mut self, order_date: NaiveDate, deadline: NaiveDate) -> Self {
        self.delivery_window = Some(DeliveryWindow {
            order_date,
            deadline,
        });
        self
    }

    /// Host-facing builder: the delivery window applies only when an order date is known.
    pub fn for_rfq(rfq: &Rfq, margin_floor: f64, order_date: Option<NaiveDate>) -> Self {
        let constraints = Self::new(margin_floor);
        match order_date {
            Some(order_date) => constraints.delivered_by(order_date, rfq.deadline),
            None => constraints,
        }
    }
}

/// The chosen offer and where it sat in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub index: usize,
    pub offer: ScoredOffer,
    pub feasible_count: usize,
}

/// Nothing cleared the constraints. An expected outcome: lower the floor or source more offers.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error(
    "no feasible offer for margin floor {margin_floor:.2}: {offers_considered} considered, \
     {below_floor} below the floor, {outside_delivery_window} miss the deadline"
)]
pub struct NoFeasibleOfferError {
    pub margin_floor: f64,
    pub offers_considered: usize,
    pub below_floor: usize,
    pub outside_delivery_window: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("margin floor {0} must be a fraction between 0 and 1")]
    InvalidMarginFloor(f64),
    #[error(transparent)]
    NoFeasibleOffer(#[from] NoFeasibleOfferError),
}

/// Picks the feasible offer with the largest `p_win * margin`.
///
/// Ties go to the lexicographically smaller supplier id, then to the earlier offer, so repeated
/// calls on the same input always agree.
pub fn select(
    scored_offers: &[ScoredOffer],
    constraints: &SelectionConstraints,
) -> Result<Selection, SelectionError> {
    let floor = constraints.margin_floor;
    if !(0.0..=1.0).contains(&floor) {
        return Err(SelectionError::InvalidMarginFloor(floor));
    }

    let program = SelectionProgram::build(scored_offers, constraints);
    match program.solve() {
        Ok(solution) => {
            debug!(
                chosen = solution.chosen,
                objective = solution.objective,
                feasible = solution.free_variables,
                "selection program solved"
            );
            Ok(Selection {
                index: solution.chosen,
                offer: scored_offers[solution.chosen].clone(),
                feasible_count: solution.free_variables,
            })
        }
        Err(infeasible) => {
            let mut error = NoFeasibleOfferError {
                margin_floor: floor,
                offers_considered: scored_offers.len(),
                below_floor: 0,
                outside_delivery_window: 0,
            };
            for (constraint, count) in infeasible.fixed_by {
                match constraint {
                    Constraint::MarginFloor(_) => error.below_floor += count,
                    Constraint::DeliveryWindow(_) => error.outside_delivery_window += count,
                }
            }
            Err(error.into())
        }
    }
}

use std::cmp::Ordering;

use chrono::Days;

use super::super::domain::ScoredOffer;
use super::{DeliveryWindow, SelectionConstraints};

/// Ordering shared by selection and ranking: higher objective first, then the lexicographically
/// smaller supplier id, then the earlier input position.
pub(crate) fn rank_order(
    left: &ScoredOffer,
    left_index: usize,
    right: &ScoredOffer,
    right_index: usize,
) -> Ordering {
    right
        .objective_value()
        .total_cmp(&left.objective_value())
        .then_with(|| left.supplier_id().cmp(right.supplier_id()))
        .then_with(|| left_index.cmp(&right_index))
}

/// Linear constraint that pins an offer's decision variable to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Constraint {
    MarginFloor(f64),
    DeliveryWindow(DeliveryWindow),
}

impl Constraint {
    fn excludes(&self, offer: &ScoredOffer) -> bool {
        match self {
            Constraint::MarginFloor(floor) => offer.margin().is_nan() || offer.margin() < *floor,
            Constraint::DeliveryWindow(window) => window
                .order_date
                .checked_add_days(Days::new(u64::from(offer.offer().lead_time_days)))
                .map_or(true, |arrival| arrival > window.deadline),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DecisionVariable {
    objective: f64,
    upper_bound: u8,
    fixed_by: Option<usize>,
}

/// `max Σ objective_i · x_i` subject to `Σ x_i = 1`, `x_i ∈ {0, 1}` and the fixings.
#[derive(Debug)]
pub(crate) struct SelectionProgram<'a> {
    offers: &'a [ScoredOffer],
    constraints: Vec<Constraint>,
    variables: Vec<DecisionVariable>,
}

/// Optimal assignment: `x_chosen = 1`, every other variable 0.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Solution {
    pub(crate) chosen: usize,
    pub(crate) objective: f64,
    pub(crate) free_variables: usize,
}

/// How many variables each constraint fixed to zero, in constraint order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Infeasible {
    pub(crate) fixed_by: Vec<(Constraint, usize)>,
}

impl<'a> SelectionProgram<'a> {
    pub(crate) fn build(offers: &'a [ScoredOffer], constraints: &SelectionConstraints) -> Self {
        let mut rows = vec![Constraint::MarginFloor(constraints.margin_floor)];
        if let Some(window) = constraints.delivery_window {
            rows.push(Constraint::DeliveryWindow(window));
        }

        let variables = offers
            .iter()
            .map(|offer| {
                let fixed_by = rows.iter().position(|row| row.excludes(offer));
                DecisionVariable {
                    objective: offer.objective_value(),
                    upper_bound: u8::from(fixed_by.is_none()),
                    fixed_by,
                }
            })
            .collect();

        Self {
            offers,
            constraints: rows,
            variables,
        }
    }

    /// With a single cardinality row the relaxation's optimum sits on a vertex, so the best free
    /// variable is the integral optimum.
    pub(crate) fn solve(&self) -> Result<Solution, Infeasible> {
        let mut best: Option<usize> = None;
        let mut free_variables = 0;

        for (idx, variable) in self.variables.iter().enumerate() {
            if variable.upper_bound == 0 {
                continue;
            }
            free_variables += 1;
            best = match best {
                Some(current)
                    if rank_order(&self.offers[current], current, &self.offers[idx], idx)
                        != Ordering::Greater =>
                {
                    Some(current)
                }
                _ => Some(idx),
            };
        }

        match best {
            Some(chosen) => Ok(Solution {
                chosen,
                objective: self.variables[chosen].objective,
                free_variables,
            }),
            None => Err(Infeasible {
                fixed_by: self
                    .constraints
                    .iter()
                    .enumerate()
                    .map(|(row, constraint)| {
                        let count = self
                            .variables
                            .iter()
                            .filter(|variable| variable.fixed_by == Some(row))
                            .count();
                        (*constraint, count)
                    })
                    .collect(),
            }),
        }
    }
}

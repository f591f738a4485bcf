use crate::equilibrium::find_equilibrium;
use crate::error::ScheduleViolation;
use crate::{Equilibrium, MarketError, Role};
use serde::Serialize;

/// Read-only summary of a pair of schedules
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketStructure {
    pub demand_size: usize,
    pub supply_size: usize,
    /// (min, max) willingness to pay
    pub demand_range: Option<(i64, i64)>,
    /// (min, max) cost
    pub supply_range: Option<(i64, i64)>,
    pub potential_trades: usize,

    // Populated only when both sides are non-empty
    pub demand_avg: Option<f64>,
    pub supply_avg: Option<f64>,
    /// Best buyer can afford the cheapest seller
    pub price_overlap: Option<bool>,
    pub equilibrium: Option<Equilibrium>,
    /// Matched quantity over potential trades
    pub efficiency: Option<f64>,
}

impl MarketStructure {
    pub fn analyze(demand: &[i64], supply: &[i64]) -> Self {
        let potential_trades = demand.len().min(supply.len());

        let mut structure = MarketStructure {
            demand_size: demand.len(),
            supply_size: supply.len(),
            demand_range: range(demand),
            supply_range: range(supply),
            potential_trades,
            demand_avg: None,
            supply_avg: None,
            price_overlap: None,
            equilibrium: None,
            efficiency: None,
        };

        if let (Some(&best_wtp), Some(&best_cost)) = (demand.first(), supply.first()) {
            let equilibrium = find_equilibrium(demand, supply);
            structure.demand_avg = Some(mean(demand));
            structure.supply_avg = Some(mean(supply));
            structure.price_overlap = Some(best_wtp >= best_cost);
            structure.efficiency = Some(equilibrium.quantity as f64 / potential_trades as f64);
            structure.equilibrium = Some(equilibrium);
        }

        structure
    }
}

fn range(values: &[i64]) -> Option<(i64, i64)> {
    let min = values.iter().min()?;
    let max = values.iter().max()?;
    Some((*min, *max))
}

fn mean(values: &[i64]) -> f64 {
    values.iter().map(|&v| v as i128).sum::<i128>() as f64 / values.len() as f64
}

/// Check that schedules handed in from outside are usable.
///
/// Rejects two empty sides, negative valuations, and schedules not sorted in
/// their canonical direction.
pub fn validate_schedules(demand: &[i64], supply: &[i64]) -> Result<(), MarketError> {
    if demand.is_empty() && supply.is_empty() {
        return Err(ScheduleViolation::BothEmpty.into());
    }

    for (role, values) in [(Role::Buyer, demand), (Role::Seller, supply)] {
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| **v < 0) {
            return Err(ScheduleViolation::NegativeValue { role, index, value }.into());
        }

        let out_of_order = values.windows(2).position(|w| match role {
            Role::Buyer => w[0] < w[1],
            Role::Seller => w[0] > w[1],
        });
        if let Some(index) = out_of_order {
            return Err(ScheduleViolation::Unsorted {
                role,
                index: index + 1,
            }
            .into());
        }
    }

    Ok(())
}

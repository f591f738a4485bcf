use crate::Equilibrium;

fn midpoint(a: i64, b: i64) -> f64 {
    (a as f64 + b as f64) / 2.0
}

/// Find equilibrium quantity and price by pairwise matching.
///
/// `demand` must be sorted high to low and `supply` low to high. Pair `i`
/// matches while `demand[i] >= supply[i]`; the scan stops at the first
/// failure since the gap only widens from there.
///
/// Pricing:
/// - one or both sides empty: reference price from whichever side exists, else 0
/// - no matches: midpoint of best bid and best ask
/// - every comparable pair matched: midpoint of the last matched pair
/// - otherwise: midpoint of the first unmatched buyer and last matched seller
pub fn find_equilibrium(demand: &[i64], supply: &[i64]) -> Equilibrium {
    let (best_wtp, best_cost) = match (demand.first(), supply.first()) {
        (None, None) => {
            tracing::warn!("empty demand and supply schedules");
            return Equilibrium {
                quantity: 0,
                price: 0.0,
            };
        }
        (None, Some(&cost)) => {
            tracing::warn!("empty demand schedule");
            return Equilibrium {
                quantity: 0,
                price: cost as f64,
            };
        }
        (Some(&wtp), None) => {
            tracing::warn!("empty supply schedule");
            return Equilibrium {
                quantity: 0,
                price: wtp as f64,
            };
        }
        (Some(&wtp), Some(&cost)) => (wtp, cost),
    };

    if best_wtp < best_cost {
        tracing::debug!(best_wtp, best_cost, "no trade possible");
        return Equilibrium {
            quantity: 0,
            price: midpoint(best_wtp, best_cost),
        };
    }

    let mut matches = 0;
    let mut last_pair = None;
    for (&wtp, &cost) in demand.iter().zip(supply) {
        if wtp < cost {
            break;
        }
        matches += 1;
        last_pair = Some((wtp, cost));
    }

    let Some((last_wtp, last_cost)) = last_pair else {
        return Equilibrium {
            quantity: 0,
            price: midpoint(best_wtp, best_cost),
        };
    };

    let comparable = demand.len().min(supply.len());
    let price = if matches == comparable {
        tracing::debug!(quantity = matches, "full trade equilibrium");
        midpoint(last_wtp, last_cost)
    } else {
        // Marginal units: next buyer in line against the last seller that traded
        tracing::debug!(quantity = matches, "partial trade equilibrium");
        midpoint(demand[matches], last_cost)
    };

    Equilibrium {
        quantity: matches,
        price,
    }
}

/// Total surplus over the first `quantity` units.
///
/// Truncated to the shorter schedule. Terms are not clamped, so a `quantity`
/// beyond the matcher's includes negative contributions as-is.
pub fn total_surplus(demand: &[i64], supply: &[i64], quantity: i64) -> f64 {
    if quantity <= 0 {
        return 0.0;
    }

    let units = (quantity as usize).min(demand.len()).min(supply.len());
    let total: i128 = demand[..units]
        .iter()
        .zip(&supply[..units])
        .map(|(&wtp, &cost)| wtp as i128 - cost as i128)
        .sum();

    let total = total as f64;
    tracing::debug!(total, units, "total surplus");
    total
}

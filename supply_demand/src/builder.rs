use crate::segments::sample_segments;
use crate::{Market, MarketError, MarketParams, Population, Role};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// RNG for one run: seeded when reproducibility is requested, OS entropy otherwise
pub fn market_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Build the sorted demand and supply schedules for `params`.
///
/// A single RNG is created from `params.seed` and shared by both sides.
pub fn build_market(params: &MarketParams) -> Result<Market, MarketError> {
    let mut rng = market_rng(params.seed);
    build_market_with_rng(params, &mut rng)
}

/// Build from a caller-supplied RNG.
///
/// Structural checks run before the first draw. Buyers are always drawn
/// before sellers; changing that order changes every seeded result.
pub fn build_market_with_rng<R: Rng>(
    params: &MarketParams,
    rng: &mut R,
) -> Result<Market, MarketError> {
    params.check_structure()?;

    let buyers = generate(params.buyer_population(), Role::Buyer, rng)?;
    let sellers = generate(params.seller_population(), Role::Seller, rng)?;

    let demand = sort_demand(buyers);
    let supply = sort_supply(sellers);

    tracing::debug!(
        buyers = demand.len(),
        sellers = supply.len(),
        best_wtp = demand.first().copied(),
        best_cost = supply.first().copied(),
        "built market"
    );

    Ok(Market { demand, supply })
}

fn generate<R: Rng>(
    population: Population<'_>,
    role: Role,
    rng: &mut R,
) -> Result<Vec<i64>, MarketError> {
    match population {
        Population::Segments(segments) => {
            let values = sample_segments(segments, rng)
                .map_err(|source| MarketError::Segment { role, source })?;
            if values.is_empty() {
                return Err(MarketError::EmptyPopulation { role });
            }
            Ok(values)
        }
        // count > 0 and max > min already hold via check_structure
        Population::Uniform { count, min, max } => {
            Ok((0..count).map(|_| rng.random_range(min..=max)).collect())
        }
    }
}

/// Willingness to pay, highest first
pub fn sort_demand(mut buyers: Vec<i64>) -> Vec<i64> {
    buyers.sort_unstable_by(|a, b| b.cmp(a));
    buyers
}

/// Costs, lowest first
pub fn sort_supply(mut sellers: Vec<i64>) -> Vec<i64> {
    sellers.sort_unstable();
    sellers
}

//! Supply and demand market equilibrium engine
//!
//! Generates buyer willingness-to-pay and seller cost populations, sorts them
//! into demand (high to low) and supply (low to high) schedules, matches
//! buyers against sellers pairwise to find the equilibrium quantity and price,
//! and computes the total surplus realised at that equilibrium.
//!
//! Pipeline:
//! - `segments`: sample integer valuations from declarative segments
//! - `builder`: build both populations from one seeded RNG and sort them
//! - `equilibrium`: pairwise matching and surplus
//! - `schedule`: (quantity, price) step tables for presentation
//! - `analysis`: read-only structure report and schedule validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod analysis;
pub mod builder;
pub mod config;
pub mod equilibrium;
pub mod error;
pub mod schedule;
pub mod segments;

pub use config::Limits;
pub use error::{MarketError, SegmentConstraint, SegmentError};

/// Side of the market a participant belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Buyer => write!(f, "buyer"),
            Role::Seller => write!(f, "seller"),
        }
    }
}

/// Shape of the valuations drawn for a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Distribution {
    #[default]
    Uniform,
    Normal,
}

impl FromStr for Distribution {
    type Err = SegmentConstraint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(Distribution::Uniform),
            "normal" => Ok(Distribution::Normal),
            other => Err(SegmentConstraint::UnknownDistribution(other.to_string())),
        }
    }
}

impl TryFrom<String> for Distribution {
    type Error = SegmentConstraint;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Uniform => write!(f, "uniform"),
            Distribution::Normal => write!(f, "normal"),
        }
    }
}

/// A homogeneous sub-population of buyers or sellers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Number of participants to generate
    #[serde(alias = "n")]
    pub count: usize,
    /// Inclusive lower bound on generated valuations
    #[serde(alias = "p_min")]
    pub price_min: i64,
    /// Inclusive upper bound on generated valuations
    #[serde(alias = "p_max")]
    pub price_max: i64,
    #[serde(default, alias = "dist")]
    pub distribution: Distribution,
    /// Normal only: centre of the distribution (defaults to midpoint)
    #[serde(default)]
    pub mean: Option<f64>,
    /// Normal only: spread (defaults to span / 6, minimum 1.0)
    #[serde(default, alias = "sd")]
    pub std_dev: Option<f64>,
}

impl Segment {
    pub fn uniform(count: usize, price_min: i64, price_max: i64) -> Self {
        Segment {
            count,
            price_min,
            price_max,
            distribution: Distribution::Uniform,
            mean: None,
            std_dev: None,
        }
    }

    pub fn normal(count: usize, price_min: i64, price_max: i64) -> Self {
        Segment {
            distribution: Distribution::Normal,
            ..Segment::uniform(count, price_min, price_max)
        }
    }

    pub fn with_mean(mut self, mean: f64) -> Self {
        self.mean = Some(mean);
        self
    }

    pub fn with_std_dev(mut self, std_dev: f64) -> Self {
        self.std_dev = Some(std_dev);
        self
    }

    /// Check bounds and, for normal segments, the optional mean/std_dev
    pub fn validate(&self) -> Result<(), SegmentConstraint> {
        if self.price_min > self.price_max {
            return Err(SegmentConstraint::PriceBoundsInverted {
                price_min: self.price_min,
                price_max: self.price_max,
            });
        }

        if self.distribution == Distribution::Normal {
            if let Some(mean) = self.mean {
                if !(self.price_min as f64 <= mean && mean <= self.price_max as f64) {
                    return Err(SegmentConstraint::MeanOutOfBounds {
                        mean,
                        price_min: self.price_min,
                        price_max: self.price_max,
                    });
                }
            }
            if let Some(sd) = self.std_dev {
                if !sd.is_finite() {
                    return Err(SegmentConstraint::NonFiniteStdDev(sd));
                }
                if sd <= 0.0 {
                    return Err(SegmentConstraint::NonPositiveStdDev(sd));
                }
            }
        }

        Ok(())
    }

    /// Mean used for normal draws
    pub fn effective_mean(&self) -> f64 {
        self.mean
            .unwrap_or((self.price_min as f64 + self.price_max as f64) / 2.0)
    }

    /// Standard deviation used for normal draws.
    ///
    /// The default span/6 puts roughly 95% of unclamped draws inside the bounds.
    pub fn effective_std_dev(&self) -> f64 {
        let span = self.price_max as f64 - self.price_min as f64;
        self.std_dev.unwrap_or_else(|| (span / 6.0).max(1.0))
    }
}

/// How one side of the market is populated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Population<'a> {
    Segments(&'a [Segment]),
    Uniform { count: usize, min: i64, max: i64 },
}

/// Parameters for one simulation run.
///
/// Segments take precedence over the legacy uniform-range fields when present
/// and non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketParams {
    pub num_buyers: usize,
    pub num_sellers: usize,
    pub min_wtp: i64,
    pub max_wtp: i64,
    pub min_cost: i64,
    pub max_cost: i64,
    /// Seed for reproducible runs; `None` draws from OS entropy
    pub seed: Option<u64>,
    pub buyer_segments: Option<Vec<Segment>>,
    pub seller_segments: Option<Vec<Segment>>,
}

impl Default for MarketParams {
    fn default() -> Self {
        MarketParams {
            num_buyers: 10,
            num_sellers: 10,
            min_wtp: 10,
            max_wtp: 40,
            min_cost: 5,
            max_cost: 35,
            seed: None,
            buyer_segments: None,
            seller_segments: None,
        }
    }
}

impl MarketParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_buyer_segments(mut self, segments: Vec<Segment>) -> Self {
        self.buyer_segments = Some(segments);
        self
    }

    pub fn with_seller_segments(mut self, segments: Vec<Segment>) -> Self {
        self.seller_segments = Some(segments);
        self
    }

    pub fn population(&self, role: Role) -> Population<'_> {
        let (segments, count, min, max) = match role {
            Role::Buyer => (
                &self.buyer_segments,
                self.num_buyers,
                self.min_wtp,
                self.max_wtp,
            ),
            Role::Seller => (
                &self.seller_segments,
                self.num_sellers,
                self.min_cost,
                self.max_cost,
            ),
        };

        match segments.as_deref() {
            Some(segs) if !segs.is_empty() => Population::Segments(segs),
            _ => Population::Uniform { count, min, max },
        }
    }

    pub fn buyer_population(&self) -> Population<'_> {
        self.population(Role::Buyer)
    }

    pub fn seller_population(&self) -> Population<'_> {
        self.population(Role::Seller)
    }

    /// Domain checks that need no deployment limits.
    ///
    /// Runs before any sampling so an infeasible legacy market never touches
    /// the RNG.
    pub fn check_structure(&self) -> Result<(), MarketError> {
        for role in [Role::Buyer, Role::Seller] {
            match self.population(role) {
                Population::Segments(segs) => {
                    for (index, seg) in segs.iter().enumerate() {
                        seg.validate().map_err(|constraint| MarketError::Segment {
                            role,
                            source: SegmentError { index, constraint },
                        })?;
                    }
                }
                Population::Uniform { count, min, max } => {
                    if count == 0 {
                        return Err(MarketError::Range {
                            role,
                            violation: error::RangeViolation::NonPositiveCount(count),
                        });
                    }
                    if max <= min {
                        return Err(MarketError::Range {
                            role,
                            violation: error::RangeViolation::MaxNotAboveMin { min, max },
                        });
                    }
                }
            }
        }

        // Only declared legacy ranges are checked; sampled segment markets
        // fall through to the matcher's no-trade branches.
        if let (Population::Uniform { max: max_wtp, .. }, Population::Uniform { min: min_cost, .. }) =
            (self.buyer_population(), self.seller_population())
        {
            if max_wtp < min_cost {
                return Err(MarketError::Infeasible { max_wtp, min_cost });
            }
        }

        Ok(())
    }

    /// Full validation against the injected deployment ceilings
    pub fn validate(&self, limits: &Limits) -> Result<(), MarketError> {
        use crate::error::LimitViolation;

        for role in [Role::Buyer, Role::Seller] {
            let max_participants = match role {
                Role::Buyer => limits.max_buyers,
                Role::Seller => limits.max_sellers,
            };
            let limit_err = |violation| MarketError::Limit { role, violation };

            let (participants, bounds): (usize, Vec<i64>) = match self.population(role) {
                Population::Segments(segs) => {
                    if segs.len() > limits.max_segments {
                        return Err(limit_err(LimitViolation::TooManySegments {
                            count: segs.len(),
                            limit: limits.max_segments,
                        }));
                    }
                    // Saturates so oversized counts land on the ceiling check
                    (
                        segs.iter()
                            .fold(0usize, |total, s| total.saturating_add(s.count)),
                        segs.iter()
                            .flat_map(|s| [s.price_min, s.price_max])
                            .collect(),
                    )
                }
                Population::Uniform { count, min, max } => (count, vec![min, max]),
            };

            if participants > max_participants {
                return Err(limit_err(LimitViolation::TooManyParticipants {
                    count: participants,
                    limit: max_participants,
                }));
            }

            if let Some(&price) = bounds
                .iter()
                .find(|&&p| p < 0 || p > limits.max_price)
            {
                return Err(limit_err(LimitViolation::PriceOutOfRange {
                    price,
                    limit: limits.max_price,
                }));
            }
        }

        self.check_structure()
    }
}

/// Sorted buyer and seller valuations for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    /// Willingness to pay, highest first
    pub demand: Vec<i64>,
    /// Costs, lowest first
    pub supply: Vec<i64>,
}

/// Equilibrium quantity and clearing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equilibrium {
    pub quantity: usize,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surplus {
    /// Sum of (wtp - cost) over the traded units
    pub total_max: f64,
}

/// One step of a demand or supply schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub quantity: usize,
    pub price: i64,
}

/// Result bundle handed back to the service layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOutcome {
    pub demand: Vec<PricePoint>,
    pub supply: Vec<PricePoint>,
    pub equilibrium: Equilibrium,
    pub surplus: Surplus,
}

/// Validate, build, match, and summarise one market.
///
/// Either the whole outcome is produced or an error is returned.
pub fn simulate(params: &MarketParams, limits: &Limits) -> Result<MarketOutcome, MarketError> {
    params.validate(limits)?;

    let market = builder::build_market(params)?;
    let equilibrium = equilibrium::find_equilibrium(&market.demand, &market.supply);
    let total_max =
        equilibrium::total_surplus(&market.demand, &market.supply, equilibrium.quantity as i64);

    Ok(MarketOutcome {
        demand: schedule::schedule_table(&market.demand),
        supply: schedule::schedule_table(&market.supply),
        equilibrium,
        surplus: Surplus { total_max },
    })
}

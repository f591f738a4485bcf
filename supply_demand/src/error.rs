//! Error types for market construction and validation.
//!
//! Every variant is a deterministic validation failure: retrying the same
//! parameters always fails the same way.

use crate::Role;
use thiserror::Error;

/// The specific constraint a segment violated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentConstraint {
    #[error("price_min ({price_min}) > price_max ({price_max})")]
    PriceBoundsInverted { price_min: i64, price_max: i64 },

    #[error("distribution must be 'uniform' or 'normal', got '{0}'")]
    UnknownDistribution(String),

    #[error("normal mean ({mean}) must lie within [{price_min}, {price_max}]")]
    MeanOutOfBounds {
        mean: f64,
        price_min: i64,
        price_max: i64,
    },

    #[error("normal std_dev must be > 0, got {0}")]
    NonPositiveStdDev(f64),

    #[error("normal std_dev must be a finite number, got {0}")]
    NonFiniteStdDev(f64),
}

/// A segment failed validation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("segment {index}: {constraint}")]
pub struct SegmentError {
    /// Position of the offending segment in its list
    pub index: usize,
    pub constraint: SegmentConstraint,
}

/// Violations of the legacy uniform-range parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeViolation {
    #[error("count must be > 0, got {0}")]
    NonPositiveCount(usize),

    #[error("max ({max}) must be greater than min ({min})")]
    MaxNotAboveMin { min: i64, max: i64 },
}

/// Violations of the injected deployment ceilings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LimitViolation {
    #[error("{count} segments exceeds maximum of {limit}")]
    TooManySegments { count: usize, limit: usize },

    #[error("{count} participants exceeds maximum of {limit}")]
    TooManyParticipants { count: usize, limit: usize },

    #[error("price {price} outside [0, {limit}]")]
    PriceOutOfRange { price: i64, limit: i64 },
}

/// Problems with already-built schedules handed to the analysis utilities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleViolation {
    #[error("both demand and supply are empty")]
    BothEmpty,

    #[error("{role} value at index {index} is negative: {value}")]
    NegativeValue { role: Role, index: usize, value: i64 },

    #[error("{role} schedule is out of order at index {index}")]
    Unsorted { role: Role, index: usize },
}

/// Top-level error for market simulation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("invalid {role} {source}")]
    Segment {
        role: Role,
        #[source]
        source: SegmentError,
    },

    #[error("{role} segments resulted in zero participants")]
    EmptyPopulation { role: Role },

    #[error("invalid {role} range: {violation}")]
    Range { role: Role, violation: RangeViolation },

    #[error("no trade possible: max_wtp ({max_wtp}) < min_cost ({min_cost})")]
    Infeasible { max_wtp: i64, min_cost: i64 },

    #[error("{role} limit exceeded: {violation}")]
    Limit { role: Role, violation: LimitViolation },

    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleViolation),
}

impl MarketError {
    /// Whether the failure was caused by the caller's parameters.
    ///
    /// Always true today; services use this to pick a 4xx status.
    pub fn is_client_error(&self) -> bool {
        match self {
            MarketError::Segment { .. }
            | MarketError::EmptyPopulation { .. }
            | MarketError::Range { .. }
            | MarketError::Infeasible { .. }
            | MarketError::Limit { .. }
            | MarketError::Schedule(_) => true,
        }
    }
}

/// Failure loading [`crate::config::Limits`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

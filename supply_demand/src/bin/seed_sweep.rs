//! Run one parameter set across many seeds in parallel.
//!
//! Usage:
//!   seed_sweep [params.json] [num_seeds] [output.csv]
//!
//! Each seed gets its own RNG, so runs never interfere and any row can be
//! reproduced by re-running the main binary with that seed.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::env;
use std::fs;
use supply_demand::analysis::MarketStructure;
use supply_demand::builder::build_market;
use supply_demand::equilibrium::total_surplus;
use supply_demand::{Limits, MarketParams};
use tracing_subscriber::EnvFilter;

const DEFAULT_NUM_SEEDS: u64 = 100;

#[derive(Debug, Clone, Serialize)]
struct SweepRow {
    seed: u64,
    num_buyers: usize,
    num_sellers: usize,
    quantity: usize,
    price: f64,
    total_surplus: f64,
    efficiency: f64,
}

fn run_seed(params: &MarketParams, seed: u64) -> Result<SweepRow> {
    let params = params.clone().with_seed(seed);
    let market = build_market(&params)?;
    let structure = MarketStructure::analyze(&market.demand, &market.supply);
    let equilibrium = structure
        .equilibrium
        .context("market built with an empty side")?;

    Ok(SweepRow {
        seed,
        num_buyers: structure.demand_size,
        num_sellers: structure.supply_size,
        quantity: equilibrium.quantity,
        price: equilibrium.price,
        total_surplus: total_surplus(
            &market.demand,
            &market.supply,
            equilibrium.quantity as i64,
        ),
        efficiency: structure.efficiency.unwrap_or(0.0),
    })
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let params: MarketParams = match args.get(1) {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read params file: {}", path))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse params file: {}", path))?
        }
        None => MarketParams::default(),
    };
    let num_seeds = match args.get(2) {
        Some(n) => n.parse().with_context(|| format!("Invalid seed count: {}", n))?,
        None => DEFAULT_NUM_SEEDS,
    };

    // Validate once up front; every seed shares the same structure
    params.validate(&Limits::from_env()?)?;

    tracing::info!(num_seeds, "starting seed sweep");
    let rows: Vec<SweepRow> = (0..num_seeds)
        .into_par_iter()
        .map(|seed| run_seed(&params, seed))
        .collect::<Result<_>>()?;

    let mut wtr: csv::Writer<Box<dyn std::io::Write>> = match args.get(3) {
        Some(path) => csv::Writer::from_writer(Box::new(
            fs::File::create(path).with_context(|| format!("Failed to create {}", path))?,
        )),
        None => csv::Writer::from_writer(Box::new(std::io::stdout())),
    };
    for row in &rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    let quantities: Vec<f64> = rows.iter().map(|r| r.quantity as f64).collect();
    let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
    let surpluses: Vec<f64> = rows.iter().map(|r| r.total_surplus).collect();

    eprintln!("\nSeeds: {}", rows.len());
    eprintln!("{:>10} | {:>10} | {:>10}", "Metric", "Mean", "Std Dev");
    eprintln!("{:-<10}-+-{:-<10}-+-{:-<10}", "", "", "");
    for (name, values) in [
        ("Quantity", &quantities),
        ("Price", &prices),
        ("Surplus", &surpluses),
    ] {
        let (mean, std) = mean_std(values);
        eprintln!("{:>10} | {:>10.2} | {:>10.2}", name, mean, std);
    }

    Ok(())
}

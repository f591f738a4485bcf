use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use std::fs;
use std::time::Instant;
use supply_demand::schedule::render_table;
use supply_demand::{simulate, Limits, MarketOutcome, MarketParams};
use tracing_subscriber::EnvFilter;

/// Execution metadata added around the core's result
#[derive(Debug, Serialize)]
struct RunMetadata {
    elapsed_ms: f64,
    num_buyers: usize,
    num_sellers: usize,
    /// Equilibrium quantity over the shorter side
    efficiency: f64,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    #[serde(flatten)]
    outcome: &'a MarketOutcome,
    metadata: RunMetadata,
}

fn load_params(path: Option<&str>) -> Result<MarketParams> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read params file: {}", path))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse params file: {}", path))
        }
        None => Ok(MarketParams::default()),
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let params = load_params(args.get(1).map(String::as_str))?;
    let limits = Limits::from_env().context("Failed to load limits from environment")?;
    tracing::info!(?limits, seed = ?params.seed, "running market simulation");

    let start = Instant::now();
    let outcome = match simulate(&params, &limits) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, client_error = e.is_client_error(), "simulation rejected");
            return Err(e.into());
        }
    };
    let elapsed = start.elapsed();

    println!("{}", render_table("Demand", &outcome.demand));
    println!("{}", render_table("Supply", &outcome.supply));
    println!("Equilibrium Quantity: {}", outcome.equilibrium.quantity);
    println!("Equilibrium Price: {:.2}", outcome.equilibrium.price);
    println!("Total Surplus: {:.2}\n", outcome.surplus.total_max);

    let potential = outcome.demand.len().min(outcome.supply.len());
    let metadata = RunMetadata {
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        num_buyers: outcome.demand.len(),
        num_sellers: outcome.supply.len(),
        efficiency: if potential > 0 {
            outcome.equilibrium.quantity as f64 / potential as f64
        } else {
            0.0
        },
        seed: params.seed,
    };
    tracing::info!(
        quantity = outcome.equilibrium.quantity,
        price = outcome.equilibrium.price,
        elapsed_ms = metadata.elapsed_ms,
        "simulation complete"
    );

    let report = RunReport {
        outcome: &outcome,
        metadata,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

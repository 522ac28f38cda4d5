use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use stockroute_infra::{GatewaySnapshot, InMemoryGateway, ReallocationConfig, ReallocationRun, RunReport};
use stockroute_sales::Order;

use crate::args::Cli;

/// What the binary prints on stdout.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub report: RunReport,
    /// Every order in the gateway after the run, created ones included.
    pub orders: Vec<Order>,
}

pub fn load_snapshot(path: &Path) -> anyhow::Result<GatewaySnapshot> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing snapshot {}", path.display()))
}

/// Run configuration from `path`, or the default one.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ReallocationConfig> {
    let Some(path) = path else {
        return Ok(ReallocationConfig::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

/// Load the snapshot, run once against it and collect the result.
pub fn run(cli: &Cli) -> anyhow::Result<RunOutput> {
    let config = cli.reallocation_config(load_config(cli.config.as_deref())?);
    let request = cli.run_request().context("invalid run request")?;
    let snapshot = load_snapshot(&cli.snapshot)?;

    tracing::info!(
        snapshot = %cli.snapshot.display(),
        orders = snapshot.orders.len(),
        locations = snapshot.locations.len(),
        "snapshot loaded"
    );

    let gateway = Arc::new(InMemoryGateway::from_snapshot(snapshot));
    let report = ReallocationRun::new(gateway.clone(), gateway.clone(), config).execute(&request);

    Ok(RunOutput {
        report,
        orders: gateway.orders(),
    })
}

//! parkade server: application entry point.
//!
//! Loads configuration, connects to (and migrates) SurrealDB, wires the
//! services and reports occupancy consistency before idling until Ctrl-C.

mod config;

use anyhow::{Context, Result};
use parkade_db::DbManager;
use parkade_service::{CarService, FeeService, LayoutService, OccupancyService};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("parkade=info,info")),
        )
        .json()
        .init();

    info!("Starting parkade server...");

    let config = ServerConfig::from_env()?;
    let manager = DbManager::connect(&config.db)
        .await
        .context("connecting to SurrealDB")?;

    let occupancy = OccupancyService::new(manager.spots(), manager.cars(), config.service.clone());
    let layout = LayoutService::new(
        manager.garages(),
        manager.floors(),
        manager.bays(),
        manager.spots(),
    );
    let cars = CarService::new(manager.cars(), manager.fees());
    let fees = FeeService::new(manager.fees(), manager.cars());

    let garages = layout.list_garages().await?.len();
    let parked = occupancy.checked_in_cars().await?.len();
    let known_cars = cars.list_cars().await?.len();
    let billed = fees.list_fees(None).await?.len();
    info!(garages, parked, known_cars, billed, "Services ready");

    for violation in occupancy.occupancy_report().await? {
        warn!(?violation, "Occupancy mismatch found at startup");
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    info!("parkade server stopped.");
    Ok(())
}

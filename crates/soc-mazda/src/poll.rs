//! One SoC poll: find the vehicle, read its battery level

use anyhow::{Context, Result};
use mazda_client::MazdaClient;
use tracing::{error, info, warn};

/// Read the state of charge of the vehicle with `vin`
///
/// Returns `Ok(None)` when there is nothing to publish: the account has no
/// supported vehicle, the VIN is not enrolled, or the battery level is not
/// reported.
pub async fn fetch_soc(client: &mut MazdaClient, vin: &str) -> Result<Option<f64>> {
    let vehicles = client
        .get_vehicles()
        .await
        .context("Failed to retrieve vehicle list")?;
    info!("Vehicles retrieved");

    if vehicles.is_empty() {
        error!("No supported vehicle on the Mazda account");
        return Ok(None);
    }

    let Some(vehicle) = vehicles.into_iter().find(|v| v.vin == vin) else {
        info!("Vehicle {} not found", vin);
        return Ok(None);
    };
    info!("Vehicle {} found", vin);

    let status = client
        .get_ev_vehicle_status(&vehicle.id)
        .await
        .with_context(|| format!("Failed to retrieve EV status of {}", vin))?;

    match status.charge_info.battery_level_percentage {
        Some(soc) => {
            info!("Vehicle battery level = {}%", soc);
            Ok(Some(soc))
        }
        None => {
            warn!("Vehicle {} did not report a battery level", vin);
            Ok(None)
        }
    }
}

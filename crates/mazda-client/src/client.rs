//! Mazda connected-services client

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::catalog;
use crate::config::ClientConfig;
use crate::controller::{Controller, HttpController};
use crate::error::{MazdaError, Result};
use crate::lock_state::LockStateReconciler;
use crate::status::{self, parse_vendor_timestamp};
use crate::types::{EvVehicleStatus, HvacSetting, TemperatureUnit, Vehicle, VehicleStatus};

/// Client for a single connected-services account
///
/// Wraps a [`Controller`] and turns its raw payloads into normalized types.
/// It also keeps a per-vehicle lock-state cache so lock and unlock commands
/// are reflected by [`get_assumed_lock_state`](Self::get_assumed_lock_state)
/// before the status API catches up.
///
/// Operations that touch the caches take `&mut self`; a client is driven by
/// one caller at a time.
pub struct MazdaClient {
    controller: Arc<dyn Controller>,
    lock_states: LockStateReconciler,
    use_cached_vehicle_list: bool,
    cached_vehicle_list: Option<Vec<Vehicle>>,
}

impl MazdaClient {
    /// Create a client that talks HTTP to the configured region
    ///
    /// Fails with [`MazdaError::Config`] before any I/O when the email or
    /// password is empty.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let controller = HttpController::new(&config)?;
        Ok(Self::with_controller(
            Arc::new(controller),
            config.use_cached_vehicle_list,
        ))
    }

    /// Create a client on top of an existing controller
    pub fn with_controller(controller: Arc<dyn Controller>, use_cached_vehicle_list: bool) -> Self {
        Self {
            controller,
            lock_states: LockStateReconciler::new(),
            use_cached_vehicle_list,
            cached_vehicle_list: None,
        }
    }

    /// Log in to check the credentials
    #[instrument(skip(self))]
    pub async fn validate_credentials(&self) -> Result<()> {
        self.controller.login().await
    }

    // =========================================================================
    // Vehicle Catalog
    // =========================================================================

    /// List vehicles enrolled in connected services
    ///
    /// With the cached vehicle list enabled, the first successful result is
    /// kept for the lifetime of the client and never fetched again.
    #[instrument(skip(self))]
    pub async fn get_vehicles(&mut self) -> Result<Vec<Vehicle>> {
        if self.use_cached_vehicle_list {
            if let Some(vehicles) = &self.cached_vehicle_list {
                debug!("Serving {} vehicles from cache", vehicles.len());
                return Ok(vehicles.clone());
            }
        }

        let response = self.controller.get_vec_base_infos().await?;
        let base_infos = response
            .vec_base_infos
            .ok_or_else(|| MazdaError::malformed("vecBaseInfos is missing"))?;
        let flags = response
            .vehicle_flags
            .ok_or_else(|| MazdaError::malformed("vehicleFlags is missing"))?;

        let controller = self.controller.as_ref();
        let vehicles = catalog::normalize_vehicles(base_infos, flags, |vin| async move {
            controller.get_nickname(&vin).await
        })
        .await?;
        info!("Retrieved {} enrolled vehicles", vehicles.len());

        if self.use_cached_vehicle_list {
            self.cached_vehicle_list = Some(vehicles.clone());
        }
        Ok(vehicles)
    }

    /// Find an enrolled vehicle by VIN
    ///
    /// A VIN that is not enrolled on the account yields `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn find_vehicle(&mut self, vin: &str) -> Result<Option<Vehicle>> {
        let vehicle = self
            .get_vehicles()
            .await?
            .into_iter()
            .find(|v| v.vin == vin);

        if vehicle.is_none() {
            debug!("Vehicle {} is not enrolled on this account", vin);
        }
        Ok(vehicle)
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Fetch and normalize the vehicle status
    ///
    /// Also updates the API-reported lock state used by
    /// [`get_assumed_lock_state`](Self::get_assumed_lock_state).
    #[instrument(skip(self))]
    pub async fn get_vehicle_status(&mut self, vehicle_id: &str) -> Result<VehicleStatus> {
        let raw = self.controller.get_vehicle_status(vehicle_id).await?;
        let status = status::normalize_status(raw)?;
        self.record_vehicle_status(vehicle_id, &status)?;
        Ok(status)
    }

    /// Feed a status snapshot into the lock-state cache
    ///
    /// Fails when the snapshot has no parsable `lastUpdatedTimestamp`.
    pub fn record_vehicle_status(&mut self, vehicle_id: &str, status: &VehicleStatus) -> Result<()> {
        let timestamp = status
            .last_updated_timestamp
            .as_deref()
            .ok_or_else(|| MazdaError::malformed("status has no OccurrenceDate"))
            .and_then(parse_vendor_timestamp)?;

        self.lock_states
            .record_api_state(vehicle_id, status.door_locks.all_locked(), timestamp);
        Ok(())
    }

    /// Fetch and normalize the EV status (battery, charging, HVAC)
    #[instrument(skip(self))]
    pub async fn get_ev_vehicle_status(&self, vehicle_id: &str) -> Result<EvVehicleStatus> {
        let raw = self.controller.get_ev_vehicle_status(vehicle_id).await?;
        status::normalize_ev_status(raw)
    }

    /// Best guess of whether the doors are locked, `None` when unknown
    pub fn get_assumed_lock_state(&self, vehicle_id: &str) -> Option<bool> {
        self.lock_states.assumed_lock_state(vehicle_id)
    }

    /// Lock-state cache, for inspection
    pub fn lock_states(&self) -> &LockStateReconciler {
        &self.lock_states
    }

    // =========================================================================
    // Door Locks
    // =========================================================================

    /// Lock the doors
    ///
    /// The locked state is assumed before the command is sent, whether or not
    /// it succeeds.
    #[instrument(skip(self))]
    pub async fn lock_doors(&mut self, vehicle_id: &str) -> Result<()> {
        self.lock_states.record_command(vehicle_id, true);
        self.controller.door_lock(vehicle_id).await
    }

    /// Unlock the doors
    #[instrument(skip(self))]
    pub async fn unlock_doors(&mut self, vehicle_id: &str) -> Result<()> {
        self.lock_states.record_command(vehicle_id, false);
        self.controller.door_unlock(vehicle_id).await
    }

    // =========================================================================
    // Remote Commands
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn turn_on_hazard_lights(&self, vehicle_id: &str) -> Result<()> {
        self.controller.light_on(vehicle_id).await
    }

    #[instrument(skip(self))]
    pub async fn turn_off_hazard_lights(&self, vehicle_id: &str) -> Result<()> {
        self.controller.light_off(vehicle_id).await
    }

    #[instrument(skip(self))]
    pub async fn start_engine(&self, vehicle_id: &str) -> Result<()> {
        self.controller.engine_start(vehicle_id).await
    }

    #[instrument(skip(self))]
    pub async fn stop_engine(&self, vehicle_id: &str) -> Result<()> {
        self.controller.engine_stop(vehicle_id).await
    }

    /// Send a point of interest to the navigation system
    #[instrument(skip(self))]
    pub async fn send_poi(
        &self,
        vehicle_id: &str,
        latitude: f64,
        longitude: f64,
        name: &str,
    ) -> Result<()> {
        self.controller
            .send_poi(vehicle_id, latitude, longitude, name)
            .await
    }

    #[instrument(skip(self))]
    pub async fn start_charging(&self, vehicle_id: &str) -> Result<()> {
        self.controller.charge_start(vehicle_id).await
    }

    #[instrument(skip(self))]
    pub async fn stop_charging(&self, vehicle_id: &str) -> Result<()> {
        self.controller.charge_stop(vehicle_id).await
    }

    // =========================================================================
    // HVAC
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn get_hvac_setting(&self, vehicle_id: &str) -> Result<HvacSetting> {
        let raw = self.controller.get_hvac_setting(vehicle_id).await?;
        Ok(status::normalize_hvac_setting(raw))
    }

    #[instrument(skip(self))]
    pub async fn set_hvac_setting(
        &self,
        vehicle_id: &str,
        temperature: f64,
        temperature_unit: TemperatureUnit,
        front_defroster: bool,
        rear_defroster: bool,
    ) -> Result<()> {
        self.controller
            .set_hvac_setting(
                vehicle_id,
                temperature,
                temperature_unit,
                front_defroster,
                rear_defroster,
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn turn_on_hvac(&self, vehicle_id: &str) -> Result<()> {
        self.controller.hvac_on(vehicle_id).await
    }

    #[instrument(skip(self))]
    pub async fn turn_off_hvac(&self, vehicle_id: &str) -> Result<()> {
        self.controller.hvac_off(vehicle_id).await
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Ask the vehicle to upload a fresh status
    #[instrument(skip(self))]
    pub async fn refresh_vehicle_status(&self, vehicle_id: &str) -> Result<()> {
        self.controller.refresh_vehicle_status(vehicle_id).await
    }

    /// Close the session
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<()> {
        self.controller.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Region;

    #[test]
    fn test_client_creation() {
        let config = ClientConfig::builder("a@b.c", "pw", Region::Mnao)
            .build()
            .unwrap();
        assert!(MazdaClient::new(config).is_ok());
    }

    #[test]
    fn test_empty_email_fails_before_io() {
        let config = ClientConfig {
            email: String::new(),
            password: "pw".to_string(),
            region: Region::Mnao,
            base_url: None,
            timeouts: Default::default(),
            use_cached_vehicle_list: false,
        };
        assert!(matches!(
            MazdaClient::new(config),
            Err(MazdaError::Config(_))
        ));
    }

    #[test]
    fn test_empty_password_fails_before_io() {
        let config = ClientConfig {
            email: "a@b.c".to_string(),
            password: String::new(),
            region: Region::Mme,
            base_url: None,
            timeouts: Default::default(),
            use_cached_vehicle_list: false,
        };
        assert!(matches!(
            MazdaClient::new(config),
            Err(MazdaError::Config(_))
        ));
    }
}

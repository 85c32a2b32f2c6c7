//! Controller layer: session handling and raw API calls
//!
//! The [`Controller`] trait is the seam between the normalization logic in
//! [`MazdaClient`](crate::MazdaClient) and the transport. It returns vendor
//! payloads untouched; all interpretation happens above it.
//!
//! - [`HttpController`] talks to the connected-services API over HTTPS
//! - [`FakeController`](crate::testing::FakeController) serves canned
//!   payloads for tests

mod http;

pub use http::HttpController;

use async_trait::async_trait;

use crate::error::Result;
use crate::raw::{
    RawEvVehicleStatusResponse, RawHvacSettingResponse, RawVecBaseInfosResponse,
    RawVehicleStatusResponse,
};
use crate::types::TemperatureUnit;

/// Raw access to the connected-services API
///
/// Vehicle-scoped calls take the vehicle's internal id, except
/// [`get_nickname`](Controller::get_nickname) which is keyed by VIN.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Establish an authenticated session
    async fn login(&self) -> Result<()>;

    /// List vehicles with their index-aligned flags
    async fn get_vec_base_infos(&self) -> Result<RawVecBaseInfosResponse>;

    async fn get_nickname(&self, vin: &str) -> Result<String>;

    async fn get_vehicle_status(&self, internal_id: &str) -> Result<RawVehicleStatusResponse>;

    async fn get_ev_vehicle_status(&self, internal_id: &str)
        -> Result<RawEvVehicleStatusResponse>;

    async fn door_lock(&self, internal_id: &str) -> Result<()>;

    async fn door_unlock(&self, internal_id: &str) -> Result<()>;

    async fn light_on(&self, internal_id: &str) -> Result<()>;

    async fn light_off(&self, internal_id: &str) -> Result<()>;

    async fn engine_start(&self, internal_id: &str) -> Result<()>;

    async fn engine_stop(&self, internal_id: &str) -> Result<()>;

    /// Send a point of interest to the vehicle's navigation system
    async fn send_poi(
        &self,
        internal_id: &str,
        latitude: f64,
        longitude: f64,
        name: &str,
    ) -> Result<()>;

    async fn charge_start(&self, internal_id: &str) -> Result<()>;

    async fn charge_stop(&self, internal_id: &str) -> Result<()>;

    async fn get_hvac_setting(&self, internal_id: &str) -> Result<RawHvacSettingResponse>;

    async fn set_hvac_setting(
        &self,
        internal_id: &str,
        temperature: f64,
        temperature_unit: TemperatureUnit,
        front_defroster: bool,
        rear_defroster: bool,
    ) -> Result<()>;

    async fn hvac_on(&self, internal_id: &str) -> Result<()>;

    async fn hvac_off(&self, internal_id: &str) -> Result<()>;

    /// Ask the vehicle to push a fresh status to the cloud
    async fn refresh_vehicle_status(&self, internal_id: &str) -> Result<()>;

    /// End the session
    async fn close(&self) -> Result<()>;
}

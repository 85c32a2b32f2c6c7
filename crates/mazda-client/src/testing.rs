//! Test utilities for mazda-client
//!
//! - [`FakeController`]: in-memory controller with canned payloads and a
//!   call log
//! - [`TestServer`]: runs an axum router on an ephemeral port and hands out
//!   an [`HttpController`] pointed at it
//! - JSON fixture builders for vendor payloads

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::controller::{Controller, HttpController};
use crate::error::{MazdaError, Result};
use crate::raw::{
    RawEvVehicleStatusResponse, RawHvacSettingResponse, RawVecBaseInfosResponse,
    RawVehicleStatusResponse,
};
use crate::types::TemperatureUnit;

/// Credentials the [`TestServer`] controller logs in with
pub const TEST_EMAIL: &str = "test@example.com";
pub const TEST_PASSWORD: &str = "test-password";

// =============================================================================
// Fake Controller
// =============================================================================

/// A call received by the [`FakeController`]
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerCall {
    Login,
    GetVecBaseInfos,
    GetNickname(String),
    GetVehicleStatus(String),
    GetEvVehicleStatus(String),
    DoorLock(String),
    DoorUnlock(String),
    LightOn(String),
    LightOff(String),
    EngineStart(String),
    EngineStop(String),
    SendPoi {
        internal_id: String,
        latitude: f64,
        longitude: f64,
        name: String,
    },
    ChargeStart(String),
    ChargeStop(String),
    GetHvacSetting(String),
    SetHvacSetting {
        internal_id: String,
        temperature: f64,
        temperature_unit: TemperatureUnit,
        front_defroster: bool,
        rear_defroster: bool,
    },
    HvacOn(String),
    HvacOff(String),
    RefreshVehicleStatus(String),
    Close,
}

#[derive(Default)]
struct FakeState {
    vec_base_infos: Option<Value>,
    nicknames: HashMap<String, String>,
    vehicle_status: HashMap<String, Value>,
    ev_vehicle_status: HashMap<String, Value>,
    hvac_settings: HashMap<String, Value>,
    fail_commands: bool,
    calls: Vec<ControllerCall>,
}

/// In-memory [`Controller`] serving canned vendor payloads
///
/// Payloads are stored as JSON and deserialized on every call, so tests
/// exercise the same decoding path as the HTTP controller.
#[derive(Default)]
pub struct FakeController {
    state: RwLock<FakeState>,
}

impl FakeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the `getVecBaseInfos` payload
    pub fn set_vec_base_infos(&self, payload: Value) {
        self.state.write().vec_base_infos = Some(payload);
    }

    pub fn set_nickname(&self, vin: &str, nickname: &str) {
        self.state
            .write()
            .nicknames
            .insert(vin.to_string(), nickname.to_string());
    }

    pub fn set_vehicle_status(&self, internal_id: &str, payload: Value) {
        self.state
            .write()
            .vehicle_status
            .insert(internal_id.to_string(), payload);
    }

    pub fn set_ev_vehicle_status(&self, internal_id: &str, payload: Value) {
        self.state
            .write()
            .ev_vehicle_status
            .insert(internal_id.to_string(), payload);
    }

    pub fn set_hvac_setting(&self, internal_id: &str, payload: Value) {
        self.state
            .write()
            .hvac_settings
            .insert(internal_id.to_string(), payload);
    }

    /// Make every vehicle command fail with a server error
    pub fn fail_commands(&self, fail: bool) {
        self.state.write().fail_commands = fail;
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<ControllerCall> {
        self.state.read().calls.clone()
    }

    /// Number of received calls matching `predicate`
    pub fn count_calls(&self, predicate: impl Fn(&ControllerCall) -> bool) -> usize {
        self.state.read().calls.iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: ControllerCall) {
        self.state.write().calls.push(call);
    }

    fn command(&self, call: ControllerCall) -> Result<()> {
        self.record(call);
        if self.state.read().fail_commands {
            Err(MazdaError::server_error(500, "command rejected"))
        } else {
            Ok(())
        }
    }

    fn decode<T: DeserializeOwned>(payload: Option<Value>, what: &str) -> Result<T> {
        let payload = payload
            .ok_or_else(|| MazdaError::server_error(404, format!("no {} configured", what)))?;
        serde_json::from_value(payload).map_err(|e| MazdaError::malformed(e.to_string()))
    }
}

#[async_trait]
impl Controller for FakeController {
    async fn login(&self) -> Result<()> {
        self.record(ControllerCall::Login);
        Ok(())
    }

    async fn get_vec_base_infos(&self) -> Result<RawVecBaseInfosResponse> {
        self.record(ControllerCall::GetVecBaseInfos);
        let payload = self.state.read().vec_base_infos.clone();
        Self::decode(payload, "vehicle catalog")
    }

    async fn get_nickname(&self, vin: &str) -> Result<String> {
        self.record(ControllerCall::GetNickname(vin.to_string()));
        Ok(self
            .state
            .read()
            .nicknames
            .get(vin)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_vehicle_status(&self, internal_id: &str) -> Result<RawVehicleStatusResponse> {
        self.record(ControllerCall::GetVehicleStatus(internal_id.to_string()));
        let payload = self.state.read().vehicle_status.get(internal_id).cloned();
        Self::decode(payload, "vehicle status")
    }

    async fn get_ev_vehicle_status(
        &self,
        internal_id: &str,
    ) -> Result<RawEvVehicleStatusResponse> {
        self.record(ControllerCall::GetEvVehicleStatus(internal_id.to_string()));
        let payload = self.state.read().ev_vehicle_status.get(internal_id).cloned();
        Self::decode(payload, "EV status")
    }

    async fn door_lock(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::DoorLock(internal_id.to_string()))
    }

    async fn door_unlock(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::DoorUnlock(internal_id.to_string()))
    }

    async fn light_on(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::LightOn(internal_id.to_string()))
    }

    async fn light_off(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::LightOff(internal_id.to_string()))
    }

    async fn engine_start(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::EngineStart(internal_id.to_string()))
    }

    async fn engine_stop(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::EngineStop(internal_id.to_string()))
    }

    async fn send_poi(
        &self,
        internal_id: &str,
        latitude: f64,
        longitude: f64,
        name: &str,
    ) -> Result<()> {
        self.command(ControllerCall::SendPoi {
            internal_id: internal_id.to_string(),
            latitude,
            longitude,
            name: name.to_string(),
        })
    }

    async fn charge_start(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::ChargeStart(internal_id.to_string()))
    }

    async fn charge_stop(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::ChargeStop(internal_id.to_string()))
    }

    async fn get_hvac_setting(&self, internal_id: &str) -> Result<RawHvacSettingResponse> {
        self.record(ControllerCall::GetHvacSetting(internal_id.to_string()));
        let payload = self.state.read().hvac_settings.get(internal_id).cloned();
        Self::decode(payload, "HVAC setting")
    }

    async fn set_hvac_setting(
        &self,
        internal_id: &str,
        temperature: f64,
        temperature_unit: TemperatureUnit,
        front_defroster: bool,
        rear_defroster: bool,
    ) -> Result<()> {
        self.command(ControllerCall::SetHvacSetting {
            internal_id: internal_id.to_string(),
            temperature,
            temperature_unit,
            front_defroster,
            rear_defroster,
        })
    }

    async fn hvac_on(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::HvacOn(internal_id.to_string()))
    }

    async fn hvac_off(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::HvacOff(internal_id.to_string()))
    }

    async fn refresh_vehicle_status(&self, internal_id: &str) -> Result<()> {
        self.command(ControllerCall::RefreshVehicleStatus(internal_id.to_string()))
    }

    async fn close(&self) -> Result<()> {
        self.record(ControllerCall::Close);
        Ok(())
    }
}

// =============================================================================
// Test Server
// =============================================================================

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub controller: Arc<HttpController>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` and connect an [`HttpController`] to it
    ///
    /// # Example
    ///
    /// ```ignore
    /// use axum::{routing::post, Json, Router};
    /// use mazda_client::testing::TestServer;
    ///
    /// let router = Router::new().route(
    ///     "/auth/login",
    ///     post(|| async { Json(serde_json::json!({ "accessToken": "t" })) }),
    /// );
    /// let server = TestServer::start(router).await?;
    /// server.controller.login().await?;
    /// ```
    pub async fn start(router: axum::Router) -> Result<Self> {
        Self::start_with_timeout(router, Duration::from_secs(5), Duration::from_secs(2)).await
    }

    /// Create a new test server with custom timeouts
    pub async fn start_with_timeout(
        router: axum::Router,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        let controller = HttpController::with_config(
            &format!("http://{}/", addr),
            TEST_EMAIL,
            TEST_PASSWORD,
            timeout,
            connect_timeout,
        )?;

        Ok(Self {
            addr,
            controller: Arc::new(controller),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A `vecBaseInfos` entry for an MX-30 with the given identifiers
pub fn base_info_json(vin: &str, internal_vin: &str, econnect_type: i64) -> Value {
    let information = json!({
        "OtherInformation": {
            "carlineCode": "MX30",
            "carlineName": "MX-30",
            "modelYear": "2021",
            "modelCode": "DRH1",
            "modelName": "MX-30 EV",
            "transmissionType": "A",
            "interiorColorCode": "BY3",
            "interiorColorName": "BLACK",
            "exteriorColorCode": "51K",
            "exteriorColorName": "CERAMIC"
        }
    });

    json!({
        "vin": vin,
        "econnectType": econnect_type,
        "Vehicle": {
            "CvInformation": { "internalVin": internal_vin },
            "vehicleInformation": information.to_string()
        }
    })
}

/// A `vehicleFlags` entry
pub fn vehicle_flags_json(vin_regist_status: i64) -> Value {
    json!({ "vinRegistStatus": vin_regist_status })
}

/// A full `getVecBaseInfos` payload from `(vin, internal_vin, regist_status)`
pub fn catalog_json(vehicles: &[(&str, &str, i64)]) -> Value {
    json!({
        "resultCode": "200S00",
        "vecBaseInfos": vehicles
            .iter()
            .map(|(vin, id, _)| base_info_json(vin, id, 1))
            .collect::<Vec<_>>(),
        "vehicleFlags": vehicles
            .iter()
            .map(|(_, _, status)| vehicle_flags_json(*status))
            .collect::<Vec<_>>(),
    })
}

/// A `getVehicleStatus` payload with the given timestamp and unlock flags
pub fn vehicle_status_json(occurrence_date: &str, unlocked: [i64; 4]) -> Value {
    json!({
        "resultCode": "200S00",
        "alertInfos": [{
            "OccurrenceDate": occurrence_date,
            "Door": {
                "DrStatDrv": 0, "DrStatPsngr": 0, "DrStatRl": 0, "DrStatRr": 0,
                "DrStatTrnkLg": 0, "DrStatHood": 0, "FuelLidOpenStatus": 0,
                "LockLinkSwDrv": unlocked[0],
                "LockLinkSwPsngr": unlocked[1],
                "LockLinkSwRl": unlocked[2],
                "LockLinkSwRr": unlocked[3]
            },
            "Pw": { "PwPosDrv": 0, "PwPosPsngr": 0, "PwPosRl": 0, "PwPosRr": 0 },
            "HazardLamp": { "HazardSw": 0 }
        }],
        "remoteInfos": [{
            "PositionInfo": {
                "Latitude": 52.52, "LatitudeFlag": 0,
                "Longitude": 13.40, "LongitudeFlag": 1,
                "AcquisitionDatetime": occurrence_date
            },
            "ResidualFuel": { "FuelSegementDActl": 0, "RemDrvDistDActlKm": 0 },
            "DriveInformation": { "OdoDispValue": 1234.5 }
        }]
    })
}

/// A `getEVVehicleStatus` payload with the given state of charge
pub fn ev_status_json(battery_level: f64) -> Value {
    json!({
        "resultCode": "200S00",
        "resultData": [{
            "OccurrenceDate": "20240301120000",
            "PlusBInformation": {
                "VehicleInfo": {
                    "ChargeInfo": {
                        "SmaphSOC": battery_level,
                        "SmaphRemDrvDistKm": 150,
                        "ChargerConnectorFitting": 1,
                        "ChargeStatusSub": 6
                    },
                    "RemoteHvacInfo": { "HVAC": 0, "InCarTeDC": 19.5 }
                }
            }
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_controller_records_calls() {
        let fake = FakeController::new();
        fake.set_nickname("VIN", "Zoom");

        assert_eq!(fake.get_nickname("VIN").await.unwrap(), "Zoom");
        fake.door_lock("1").await.unwrap();

        assert_eq!(
            fake.calls(),
            vec![
                ControllerCall::GetNickname("VIN".to_string()),
                ControllerCall::DoorLock("1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_fake_controller_missing_payload() {
        let fake = FakeController::new();
        let err = fake.get_vehicle_status("1").await.unwrap_err();
        assert!(matches!(err, MazdaError::ServerError { status: 404, .. }));
    }

    #[test]
    fn test_catalog_fixture_is_aligned() {
        let catalog: RawVecBaseInfosResponse =
            serde_json::from_value(catalog_json(&[("A", "1", 3), ("B", "2", 1)])).unwrap();
        assert_eq!(catalog.vec_base_infos.unwrap().len(), 2);
        assert_eq!(catalog.vehicle_flags.unwrap()[1].vin_regist_status, Some(1));
    }
}

//! HTTP controller for the connected-services API

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use url::Url;

use super::Controller;
use crate::config::ClientConfig;
use crate::error::{MazdaError, Result};
use crate::raw::{
    RawEvVehicleStatusResponse, RawHvacSettingResponse, RawVecBaseInfosResponse,
    RawVehicleStatusResponse,
};
use crate::types::TemperatureUnit;

/// `resultCode` of a successful remote-service call
const RESULT_CODE_SUCCESS: &str = "200S00";

/// Placeholder the API resolves to the logged-in account
const INTERNAL_USER_ID: &str = "__INTERNAL_ID__";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NicknameResponse {
    #[serde(default)]
    carline_desc: Option<String>,
}

/// Controller that POSTs JSON to `<base>/remoteServices/<service>/v4`
///
/// Logs in lazily on the first call and sends the access token as a bearer
/// token. A 401/403 answer drops the token so the next call logs in again.
pub struct HttpController {
    client: Client,
    base_url: Url,
    email: String,
    password: String,
    access_token: RwLock<Option<String>>,
}

impl HttpController {
    /// Create a controller from a validated client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Self::with_config(
            config.api_base_url(),
            &config.email,
            &config.password,
            config.timeouts.request(),
            config.timeouts.connect(),
        )
    }

    /// Create a controller with explicit endpoint and timeouts
    pub fn with_config(
        base_url: &str,
        email: &str,
        password: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            email: email.to_string(),
            password: password.to_string(),
            access_token: RwLock::new(None),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether an access token is currently held
    pub fn has_session(&self) -> bool {
        self.access_token.read().is_some()
    }

    fn remote_service_url(&self, service: &str) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("remoteServices/{}/v4", service))?)
    }

    async fn access_token(&self) -> Result<String> {
        let cached = self.access_token.read().clone();
        if let Some(token) = cached {
            return Ok(token);
        }

        self.login().await?;
        self.access_token
            .read()
            .clone()
            .ok_or_else(|| MazdaError::Authentication("No session after login".to_string()))
    }

    /// POST a remote-service request and decode the payload
    async fn post_api<T: DeserializeOwned>(&self, service: &str, body: Value) -> Result<T> {
        let url = self.remote_service_url(service)?;
        let token = self.access_token().await?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let value = self.handle_response(response).await?;
        check_result_code(&value)?;

        serde_json::from_value(value)
            .map_err(|e| MazdaError::malformed(format!("{} response: {}", service, e)))
    }

    /// POST a vehicle command whose answer carries no payload
    async fn post_command(&self, service: &str, internal_id: &str) -> Result<()> {
        let _: Value = self.post_api(service, vehicle_body(internal_id)).await?;
        Ok(())
    }

    /// Handle response and deserialize JSON
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| MazdaError::malformed(e.to_string()))
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    async fn extract_error_from_status(
        &self,
        response: reqwest::Response,
        status: StatusCode,
    ) -> MazdaError {
        let message = match response.json::<Value>().await {
            Ok(body) => body
                .get("message")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| format!("HTTP {}", status)),
            Err(_) => format!("HTTP {}", status),
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                *self.access_token.write() = None;
                MazdaError::Authentication(message)
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => MazdaError::Timeout,
            _ => MazdaError::server_error(status.as_u16(), message),
        }
    }
}

/// Make sure relative joins land below the base path
fn parse_base_url(base_url: &str) -> Result<Url> {
    if base_url.ends_with('/') {
        Ok(Url::parse(base_url)?)
    } else {
        Ok(Url::parse(&format!("{}/", base_url))?)
    }
}

fn map_send_error(e: reqwest::Error) -> MazdaError {
    if e.is_timeout() {
        MazdaError::Timeout
    } else {
        MazdaError::HttpError(e)
    }
}

fn check_result_code(body: &Value) -> Result<()> {
    match body.get("resultCode").and_then(Value::as_str) {
        Some(code) if code != RESULT_CODE_SUCCESS => Err(MazdaError::ApiError {
            code: code.to_string(),
            message: body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("request failed")
                .to_string(),
        }),
        _ => Ok(()),
    }
}

fn vehicle_body(internal_id: &str) -> Value {
    json!({
        "internaluserid": INTERNAL_USER_ID,
        "internalvin": internal_id,
    })
}

fn flag(set: bool) -> i64 {
    if set {
        1
    } else {
        0
    }
}

/// Encode signed coordinates as magnitudes plus hemisphere flags
///
/// Inverse of [`signed_latitude`](crate::status::signed_latitude) and
/// [`signed_longitude`](crate::status::signed_longitude).
pub(crate) fn encode_coordinates(latitude: f64, longitude: f64) -> Value {
    json!({
        "Latitude": latitude.abs(),
        "LatitudeFlag": flag(latitude < 0.0),
        "Longitude": longitude.abs(),
        "LongitudeFlag": flag(longitude >= 0.0),
    })
}

#[async_trait]
impl Controller for HttpController {
    #[instrument(skip(self))]
    async fn login(&self) -> Result<()> {
        let url = self.base_url.join("auth/login")?;
        info!("Logging in to {}", self.base_url);

        let response = self
            .client
            .post(url)
            .json(&json!({ "email": self.email, "password": self.password }))
            .send()
            .await
            .map_err(map_send_error)?;

        let body = self.handle_response(response).await?;
        check_result_code(&body).map_err(|e| MazdaError::Authentication(e.to_string()))?;

        let login: LoginResponse = serde_json::from_value(body)
            .map_err(|e| MazdaError::malformed(format!("login response: {}", e)))?;
        let token = login
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                MazdaError::Authentication("Login response carried no access token".to_string())
            })?;

        *self.access_token.write() = Some(token);
        debug!("Login successful");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_vec_base_infos(&self) -> Result<RawVecBaseInfosResponse> {
        self.post_api(
            "getVecBaseInfos",
            json!({ "internaluserid": INTERNAL_USER_ID }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_nickname(&self, vin: &str) -> Result<String> {
        let response: NicknameResponse = self
            .post_api(
                "getNickName",
                json!({ "internaluserid": INTERNAL_USER_ID, "vin": vin }),
            )
            .await?;
        Ok(response.carline_desc.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn get_vehicle_status(&self, internal_id: &str) -> Result<RawVehicleStatusResponse> {
        self.post_api(
            "getVehicleStatus",
            json!({
                "internaluserid": INTERNAL_USER_ID,
                "internalvin": internal_id,
                "limit": 1,
                "offset": 0,
                "vecinfotype": "0",
            }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_ev_vehicle_status(
        &self,
        internal_id: &str,
    ) -> Result<RawEvVehicleStatusResponse> {
        self.post_api(
            "getEVVehicleStatus",
            json!({
                "internaluserid": INTERNAL_USER_ID,
                "internalvin": internal_id,
                "limit": 1,
                "offset": 0,
                "vecinfotype": "0",
            }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn door_lock(&self, internal_id: &str) -> Result<()> {
        self.post_command("doorLock", internal_id).await
    }

    #[instrument(skip(self))]
    async fn door_unlock(&self, internal_id: &str) -> Result<()> {
        self.post_command("doorUnlock", internal_id).await
    }

    #[instrument(skip(self))]
    async fn light_on(&self, internal_id: &str) -> Result<()> {
        self.post_command("lightOn", internal_id).await
    }

    #[instrument(skip(self))]
    async fn light_off(&self, internal_id: &str) -> Result<()> {
        self.post_command("lightOff", internal_id).await
    }

    #[instrument(skip(self))]
    async fn engine_start(&self, internal_id: &str) -> Result<()> {
        self.post_command("engineStart", internal_id).await
    }

    #[instrument(skip(self))]
    async fn engine_stop(&self, internal_id: &str) -> Result<()> {
        self.post_command("engineStop", internal_id).await
    }

    #[instrument(skip(self))]
    async fn send_poi(
        &self,
        internal_id: &str,
        latitude: f64,
        longitude: f64,
        name: &str,
    ) -> Result<()> {
        let mut placemark = encode_coordinates(latitude, longitude);
        placemark["Name"] = json!(name);
        placemark["OtherInformation"] = json!("{}");
        placemark["PoiId"] = json!(0);
        placemark["source"] = json!("google");

        let _: Value = self
            .post_api(
                "sendPOI",
                json!({
                    "internaluserid": INTERNAL_USER_ID,
                    "internalvin": internal_id,
                    "placemarkinfos": [placemark],
                }),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn charge_start(&self, internal_id: &str) -> Result<()> {
        self.post_command("chargeStart", internal_id).await
    }

    #[instrument(skip(self))]
    async fn charge_stop(&self, internal_id: &str) -> Result<()> {
        self.post_command("chargeStop", internal_id).await
    }

    #[instrument(skip(self))]
    async fn get_hvac_setting(&self, internal_id: &str) -> Result<RawHvacSettingResponse> {
        self.post_api("getHVACSetting", vehicle_body(internal_id))
            .await
    }

    #[instrument(skip(self))]
    async fn set_hvac_setting(
        &self,
        internal_id: &str,
        temperature: f64,
        temperature_unit: TemperatureUnit,
        front_defroster: bool,
        rear_defroster: bool,
    ) -> Result<()> {
        let _: Value = self
            .post_api(
                "updateHVACSetting",
                json!({
                    "internaluserid": INTERNAL_USER_ID,
                    "internalvin": internal_id,
                    "hvacsettings": {
                        "FrontDefroster": flag(front_defroster),
                        "RearDefogger": flag(rear_defroster),
                        "Temperature": temperature,
                        "TemperatureType": temperature_unit.as_vendor_code(),
                    },
                }),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn hvac_on(&self, internal_id: &str) -> Result<()> {
        self.post_command("hvacOn", internal_id).await
    }

    #[instrument(skip(self))]
    async fn hvac_off(&self, internal_id: &str) -> Result<()> {
        self.post_command("hvacOff", internal_id).await
    }

    #[instrument(skip(self))]
    async fn refresh_vehicle_status(&self, internal_id: &str) -> Result<()> {
        let _: Value = self
            .post_api(
                "activeRealTimeVehicleStatus",
                json!({
                    "internaluserid": INTERNAL_USER_ID,
                    "internalvin": internal_id,
                    "vecinfotype": "0",
                }),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn close(&self) -> Result<()> {
        *self.access_token.write() = None;
        debug!("Session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Region;
    use crate::status::{signed_latitude, signed_longitude};

    #[test]
    fn test_controller_creation() {
        let config = ClientConfig::builder("a@b.c", "pw", Region::Mme)
            .build()
            .unwrap();
        let controller = HttpController::new(&config).unwrap();
        assert_eq!(controller.base_url().as_str(), Region::Mme.base_url());
        assert!(!controller.has_session());
    }

    #[test]
    fn test_invalid_url() {
        let controller = HttpController::with_config(
            "not a url",
            "a@b.c",
            "pw",
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert!(controller.is_err());
    }

    #[test]
    fn test_remote_service_url_keeps_base_path() {
        let controller = HttpController::with_config(
            "https://example.com/prod",
            "a@b.c",
            "pw",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        let url = controller.remote_service_url("getVecBaseInfos").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/prod/remoteServices/getVecBaseInfos/v4"
        );
    }

    #[test]
    fn test_result_code() {
        assert!(check_result_code(&json!({ "resultCode": "200S00" })).is_ok());
        assert!(check_result_code(&json!({ "vecBaseInfos": [] })).is_ok());

        match check_result_code(&json!({ "resultCode": "400S01", "message": "busy" })) {
            Err(MazdaError::ApiError { code, message }) => {
                assert_eq!(code, "400S01");
                assert_eq!(message, "busy");
            }
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_coordinates_round_trip_through_sign_flags() {
        for (lat, lon) in [(35.6, 139.7), (-33.9, 151.2), (40.7, -74.0), (-12.0, -77.0)] {
            let encoded = encode_coordinates(lat, lon);
            let lat_flag = encoded["LatitudeFlag"].as_i64();
            let lon_flag = encoded["LongitudeFlag"].as_i64();
            let lat_abs = encoded["Latitude"].as_f64().unwrap();
            let lon_abs = encoded["Longitude"].as_f64().unwrap();

            assert_eq!(signed_latitude(lat_abs, lat_flag), lat);
            assert_eq!(signed_longitude(lon_abs, lon_flag), lon);
        }
    }
}

//! Raw vendor payloads as returned by the connected-services API
//!
//! Every level of nesting is an explicit struct and every field is optional.
//! An absent path, or a value of the wrong type, deserializes to `None`
//! instead of failing the whole payload. Field names follow the vendor schema
//! verbatim (including its typos).

use serde::{Deserialize, Serialize};

/// Identifier that the vendor sends either as a JSON string or a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawText {
    Text(String),
    Number(serde_json::Number),
}

impl RawText {
    /// Render the identifier as an opaque string
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Field deserializers that never reject a payload over one bad value
mod lenient {
    use serde::de::{DeserializeOwned, Deserializer};
    use serde::Deserialize;
    use serde_json::{Number, Value};

    pub fn value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
    }

    /// Integer status code; `1.0` reads as `1`, anything non-numeric as `None`
    pub fn code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => Ok(integral(&n)),
            _ => Ok(None),
        }
    }

    /// Entries of the wrong shape become `T::default()`, keeping indices aligned
    pub fn list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Array(items)) => Ok(Some(
                items
                    .into_iter()
                    .map(|item| serde_json::from_value(item).unwrap_or_default())
                    .collect(),
            )),
            _ => Ok(None),
        }
    }

    fn integral(n: &Number) -> Option<i64> {
        n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        })
    }
}

// =============================================================================
// Vehicle catalog (getVecBaseInfos)
// =============================================================================

/// Response of the base-info listing; the two lists are index-aligned
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVecBaseInfosResponse {
    #[serde(default, deserialize_with = "lenient::list")]
    pub vec_base_infos: Option<Vec<RawVecBaseInfo>>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub vehicle_flags: Option<Vec<RawVehicleFlags>>,
}

/// One vehicle record of the base-info listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVecBaseInfo {
    #[serde(default, deserialize_with = "lenient::value")]
    pub vin: Option<String>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub econnect_type: Option<i64>,
    #[serde(default, deserialize_with = "lenient::value", rename = "Vehicle")]
    pub vehicle: Option<RawVehicleBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVehicleBlock {
    #[serde(default, deserialize_with = "lenient::value", rename = "CvInformation")]
    pub cv_information: Option<RawCvInformation>,
    /// JSON document encoded as a string
    #[serde(default, deserialize_with = "lenient::value", rename = "vehicleInformation")]
    pub vehicle_information: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCvInformation {
    #[serde(default, deserialize_with = "lenient::value")]
    pub internal_vin: Option<RawText>,
}

/// Per-vehicle flags, aligned by index with the base-info records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVehicleFlags {
    #[serde(default, deserialize_with = "lenient::code")]
    pub vin_regist_status: Option<i64>,
}

/// Decoded content of `Vehicle.vehicleInformation`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVehicleInformation {
    #[serde(default, deserialize_with = "lenient::value", rename = "OtherInformation")]
    pub other_information: Option<RawOtherInformation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOtherInformation {
    #[serde(default, deserialize_with = "lenient::value")]
    pub carline_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub carline_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub model_year: Option<RawText>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub model_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub transmission_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub interior_color_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub interior_color_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub exterior_color_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub exterior_color_name: Option<String>,
}

// =============================================================================
// Vehicle status (getVehicleStatus)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVehicleStatusResponse {
    #[serde(default, deserialize_with = "lenient::list")]
    pub alert_infos: Option<Vec<RawAlertInfo>>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub remote_infos: Option<Vec<RawRemoteInfo>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawAlertInfo {
    #[serde(default, deserialize_with = "lenient::value")]
    pub occurrence_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub door: Option<RawDoor>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub pw: Option<RawPowerWindows>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub hazard_lamp: Option<RawHazardLamp>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDoor {
    #[serde(default, deserialize_with = "lenient::code")]
    pub dr_stat_drv: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub dr_stat_psngr: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub dr_stat_rl: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub dr_stat_rr: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub dr_stat_trnk_lg: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub dr_stat_hood: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub fuel_lid_open_status: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub lock_link_sw_drv: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub lock_link_sw_psngr: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub lock_link_sw_rl: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub lock_link_sw_rr: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawPowerWindows {
    #[serde(default, deserialize_with = "lenient::code")]
    pub pw_pos_drv: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub pw_pos_psngr: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub pw_pos_rl: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub pw_pos_rr: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawHazardLamp {
    #[serde(default, deserialize_with = "lenient::code")]
    pub hazard_sw: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawRemoteInfo {
    #[serde(default, deserialize_with = "lenient::value")]
    pub position_info: Option<RawPositionInfo>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub residual_fuel: Option<RawResidualFuel>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub drive_information: Option<RawDriveInformation>,
    #[serde(default, deserialize_with = "lenient::value", rename = "TPMSInformation")]
    pub tpms_information: Option<RawTpmsInformation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawPositionInfo {
    #[serde(default, deserialize_with = "lenient::value")]
    pub latitude: Option<f64>,
    /// 1 = southern hemisphere
    #[serde(default, deserialize_with = "lenient::code")]
    pub latitude_flag: Option<i64>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub longitude: Option<f64>,
    /// 1 = eastern hemisphere
    #[serde(default, deserialize_with = "lenient::code")]
    pub longitude_flag: Option<i64>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub acquisition_datetime: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawResidualFuel {
    #[serde(default, deserialize_with = "lenient::value", rename = "FuelSegementDActl")]
    pub fuel_segment_d_actl: Option<f64>,
    #[serde(default, deserialize_with = "lenient::value", rename = "RemDrvDistDActlKm")]
    pub rem_drv_dist_d_actl_km: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDriveInformation {
    #[serde(default, deserialize_with = "lenient::value")]
    pub odo_disp_value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTpmsInformation {
    #[serde(default, deserialize_with = "lenient::value", rename = "FLTPrsDispPsi")]
    pub fl_tpr_disp_psi: Option<f64>,
    #[serde(default, deserialize_with = "lenient::value", rename = "FRTPrsDispPsi")]
    pub fr_tpr_disp_psi: Option<f64>,
    #[serde(default, deserialize_with = "lenient::value", rename = "RLTPrsDispPsi")]
    pub rl_tpr_disp_psi: Option<f64>,
    #[serde(default, deserialize_with = "lenient::value", rename = "RRTPrsDispPsi")]
    pub rr_tpr_disp_psi: Option<f64>,
}

// =============================================================================
// EV status (getEVVehicleStatus)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvVehicleStatusResponse {
    #[serde(default, deserialize_with = "lenient::list")]
    pub result_data: Option<Vec<RawEvResultData>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawEvResultData {
    #[serde(default, deserialize_with = "lenient::value")]
    pub occurrence_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::value", rename = "PlusBInformation")]
    pub plus_b_information: Option<RawPlusBInformation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawPlusBInformation {
    #[serde(default, deserialize_with = "lenient::value")]
    pub vehicle_info: Option<RawEvVehicleInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawEvVehicleInfo {
    #[serde(default, deserialize_with = "lenient::value")]
    pub charge_info: Option<RawChargeInfo>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub remote_hvac_info: Option<RawRemoteHvacInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawChargeInfo {
    #[serde(default, deserialize_with = "lenient::value", rename = "SmaphSOC")]
    pub smaph_soc: Option<f64>,
    #[serde(default, deserialize_with = "lenient::value", rename = "SmaphRemDrvDistKm")]
    pub smaph_rem_drv_dist_km: Option<f64>,
    #[serde(default, deserialize_with = "lenient::code", rename = "ChargerConnectorFitting")]
    pub charger_connector_fitting: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code", rename = "ChargeStatusSub")]
    pub charge_status_sub: Option<i64>,
    #[serde(default, deserialize_with = "lenient::value", rename = "MaxChargeMinuteAC")]
    pub max_charge_minute_ac: Option<f64>,
    #[serde(default, deserialize_with = "lenient::value", rename = "MaxChargeMinuteQBC")]
    pub max_charge_minute_qbc: Option<f64>,
    #[serde(default, deserialize_with = "lenient::code", rename = "CstmzStatBatHeatAutoSW")]
    pub cstmz_stat_bat_heat_auto_sw: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code", rename = "BatteryHeaterON")]
    pub battery_heater_on: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRemoteHvacInfo {
    #[serde(default, deserialize_with = "lenient::code", rename = "HVAC")]
    pub hvac: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code", rename = "FrontDefroster")]
    pub front_defroster: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code", rename = "RearDefogger")]
    pub rear_defogger: Option<i64>,
    #[serde(default, deserialize_with = "lenient::value", rename = "InCarTeDC")]
    pub in_car_te_dc: Option<f64>,
}

// =============================================================================
// HVAC settings (getHVACSetting)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHvacSettingResponse {
    #[serde(default, deserialize_with = "lenient::value")]
    pub hvac_settings: Option<RawHvacSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawHvacSettings {
    #[serde(default, deserialize_with = "lenient::value")]
    pub temperature: Option<f64>,
    /// 1 = Celsius, anything else Fahrenheit
    #[serde(default, deserialize_with = "lenient::code")]
    pub temperature_type: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub front_defroster: Option<i64>,
    #[serde(default, deserialize_with = "lenient::code")]
    pub rear_defogger: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_absent_paths_deserialize_to_none() {
        let raw: RawVehicleStatusResponse =
            serde_json::from_value(json!({ "alertInfos": [{}], "remoteInfos": [{}] })).unwrap();
        let alert = &raw.alert_infos.unwrap()[0];
        assert!(alert.door.is_none());
        assert!(alert.occurrence_date.is_none());
    }

    #[test]
    fn test_internal_vin_accepts_string_and_number() {
        let text: RawCvInformation =
            serde_json::from_value(json!({ "internalVin": "ABC123" })).unwrap();
        assert_eq!(text.internal_vin.unwrap().into_string(), "ABC123");

        let number: RawCvInformation =
            serde_json::from_value(json!({ "internalVin": 987654 })).unwrap();
        assert_eq!(number.internal_vin.unwrap().into_string(), "987654");
    }

    #[test]
    fn test_vendor_field_names() {
        let raw: RawRemoteInfo = serde_json::from_value(json!({
            "ResidualFuel": { "FuelSegementDActl": 55.0, "RemDrvDistDActlKm": 320.5 },
            "TPMSInformation": { "FLTPrsDispPsi": 35.0 }
        }))
        .unwrap();
        assert_eq!(raw.residual_fuel.unwrap().fuel_segment_d_actl, Some(55.0));
        assert_eq!(raw.tpms_information.unwrap().fl_tpr_disp_psi, Some(35.0));
    }

    #[rstest]
    #[case(json!(1), Some(1))]
    #[case(json!(1.0), Some(1))]
    #[case(json!(6.0), Some(6))]
    #[case(json!(1.5), None)]
    #[case(json!("1"), None)]
    #[case(json!(true), None)]
    #[case(json!(null), None)]
    fn test_status_codes(#[case] code: serde_json::Value, #[case] expected: Option<i64>) {
        let door: RawDoor = serde_json::from_value(json!({ "DrStatDrv": code })).unwrap();
        assert_eq!(door.dr_stat_drv, expected);
    }

    #[test]
    fn test_wrong_types_do_not_fail_the_record() {
        let raw: RawVecBaseInfo = serde_json::from_value(json!({
            "vin": 12345,
            "econnectType": "1",
            "Vehicle": "not an object"
        }))
        .unwrap();
        assert_eq!(raw.vin, None);
        assert_eq!(raw.econnect_type, None);
        assert!(raw.vehicle.is_none());

        let position: RawPositionInfo =
            serde_json::from_value(json!({ "Latitude": "north", "LatitudeFlag": 1.0 })).unwrap();
        assert_eq!(position.latitude, None);
        assert_eq!(position.latitude_flag, Some(1));
    }

    #[test]
    fn test_malformed_list_entries_keep_their_slot() {
        let raw: RawVecBaseInfosResponse = serde_json::from_value(json!({
            "vecBaseInfos": [],
            "vehicleFlags": [{ "vinRegistStatus": 3 }, "pending", { "vinRegistStatus": "pending" }]
        }))
        .unwrap();
        let flags = raw.vehicle_flags.unwrap();
        assert_eq!(flags.len(), 3);
        assert_eq!(flags[0].vin_regist_status, Some(3));
        assert_eq!(flags[1].vin_regist_status, None);
        assert_eq!(flags[2].vin_regist_status, None);
    }
}

//! Vehicle status normalization
//!
//! Maps the raw status payloads onto [`VehicleStatus`], [`EvVehicleStatus`]
//! and [`HvacSetting`]. Boolean fields are derived by comparing a raw integer
//! code against the sentinel documented for that field; the sentinels are
//! not uniform, so each one is spelled out at its use site.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{MazdaError, Result};
use crate::raw::{
    RawEvVehicleStatusResponse, RawHvacSettingResponse, RawVehicleStatusResponse,
};
use crate::types::{
    ChargeInfo, DoorLocks, Doors, EvVehicleStatus, HvacInfo, HvacSetting, TemperatureUnit,
    TirePressure, VehicleStatus, Windows,
};

/// Format of vendor timestamps (always UTC)
pub const VENDOR_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// `ChargeStatusSub` value while charging
pub const CHARGING_STATUS: i64 = 6;

fn is(code: Option<i64>, sentinel: i64) -> bool {
    code == Some(sentinel)
}

/// Apply the vendor's latitude flag: 1 marks the southern hemisphere
pub fn signed_latitude(latitude: f64, flag: Option<i64>) -> f64 {
    if is(flag, 1) {
        -latitude
    } else {
        latitude
    }
}

/// Apply the vendor's longitude flag: only 1 marks a positive (eastern)
/// longitude, everything else is west
pub fn signed_longitude(longitude: f64, flag: Option<i64>) -> f64 {
    if is(flag, 1) {
        longitude
    } else {
        -longitude
    }
}

/// Parse a vendor `YYYYMMDDHHMMSS` timestamp as UTC
pub fn parse_vendor_timestamp(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, VENDOR_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| MazdaError::malformed(format!("invalid timestamp {:?}: {}", value, e)))
}

fn first<T>(list: Option<Vec<T>>, name: &str) -> Result<T> {
    list.and_then(|items| items.into_iter().next())
        .ok_or_else(|| MazdaError::malformed(format!("{} is missing or empty", name)))
}

/// Normalize a `getVehicleStatus` response
pub fn normalize_status(raw: RawVehicleStatusResponse) -> Result<VehicleStatus> {
    let alert = first(raw.alert_infos, "alertInfos")?;
    let remote = first(raw.remote_infos, "remoteInfos")?;

    let position = remote.position_info.unwrap_or_default();
    let fuel = remote.residual_fuel.unwrap_or_default();
    let tpms = remote.tpms_information.unwrap_or_default();
    let door = alert.door.unwrap_or_default();
    let pw = alert.pw.unwrap_or_default();

    Ok(VehicleStatus {
        last_updated_timestamp: alert.occurrence_date,
        latitude: position
            .latitude
            .map(|lat| signed_latitude(lat, position.latitude_flag)),
        longitude: position
            .longitude
            .map(|lon| signed_longitude(lon, position.longitude_flag)),
        position_timestamp: position.acquisition_datetime,
        fuel_remaining_percent: fuel.fuel_segment_d_actl,
        fuel_distance_remaining_km: fuel.rem_drv_dist_d_actl_km,
        odometer_km: remote.drive_information.and_then(|d| d.odo_disp_value),
        doors: Doors {
            driver_door_open: is(door.dr_stat_drv, 1),
            passenger_door_open: is(door.dr_stat_psngr, 1),
            rear_left_door_open: is(door.dr_stat_rl, 1),
            rear_right_door_open: is(door.dr_stat_rr, 1),
            trunk_open: is(door.dr_stat_trnk_lg, 1),
            hood_open: is(door.dr_stat_hood, 1),
            fuel_lid_open: is(door.fuel_lid_open_status, 1),
        },
        door_locks: DoorLocks {
            driver_door_unlocked: is(door.lock_link_sw_drv, 1),
            passenger_door_unlocked: is(door.lock_link_sw_psngr, 1),
            rear_left_door_unlocked: is(door.lock_link_sw_rl, 1),
            rear_right_door_unlocked: is(door.lock_link_sw_rr, 1),
        },
        windows: Windows {
            driver_window_open: is(pw.pw_pos_drv, 1),
            passenger_window_open: is(pw.pw_pos_psngr, 1),
            rear_left_window_open: is(pw.pw_pos_rl, 1),
            rear_right_window_open: is(pw.pw_pos_rr, 1),
        },
        hazard_lights_on: is(alert.hazard_lamp.and_then(|h| h.hazard_sw), 1),
        tire_pressure: TirePressure {
            front_left_tire_pressure_psi: tpms.fl_tpr_disp_psi,
            front_right_tire_pressure_psi: tpms.fr_tpr_disp_psi,
            rear_left_tire_pressure_psi: tpms.rl_tpr_disp_psi,
            rear_right_tire_pressure_psi: tpms.rr_tpr_disp_psi,
        },
    })
}

/// Normalize a `getEVVehicleStatus` response
pub fn normalize_ev_status(raw: RawEvVehicleStatusResponse) -> Result<EvVehicleStatus> {
    let result = first(raw.result_data, "resultData")?;

    let vehicle_info = result
        .plus_b_information
        .and_then(|p| p.vehicle_info)
        .unwrap_or_default();
    let charge = vehicle_info.charge_info.unwrap_or_default();
    let hvac = vehicle_info.remote_hvac_info.unwrap_or_default();

    Ok(EvVehicleStatus {
        charge_info: ChargeInfo {
            last_updated_timestamp: result.occurrence_date,
            battery_level_percentage: charge.smaph_soc,
            driving_range_km: charge.smaph_rem_drv_dist_km,
            plugged_in: is(charge.charger_connector_fitting, 1),
            charging: is(charge.charge_status_sub, CHARGING_STATUS),
            basic_charge_time_minutes: charge.max_charge_minute_ac,
            quick_charge_time_minutes: charge.max_charge_minute_qbc,
            battery_heater_auto: is(charge.cstmz_stat_bat_heat_auto_sw, 1),
            battery_heater_on: is(charge.battery_heater_on, 1),
        },
        hvac_info: HvacInfo {
            hvac_on: is(hvac.hvac, 1),
            front_defroster: is(hvac.front_defroster, 1),
            rear_defroster: is(hvac.rear_defogger, 1),
            interior_temperature_celsius: hvac.in_car_te_dc,
        },
    })
}

/// Normalize a `getHVACSetting` response
pub fn normalize_hvac_setting(raw: RawHvacSettingResponse) -> HvacSetting {
    let settings = raw.hvac_settings.unwrap_or_default();

    HvacSetting {
        temperature: settings.temperature,
        temperature_unit: if is(settings.temperature_type, 1) {
            TemperatureUnit::Celsius
        } else {
            TemperatureUnit::Fahrenheit
        },
        front_defroster: is(settings.front_defroster, 1),
        rear_defroster: is(settings.rear_defogger, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn status(value: serde_json::Value) -> Result<VehicleStatus> {
        normalize_status(serde_json::from_value(value).unwrap())
    }

    fn ev_status(value: serde_json::Value) -> Result<EvVehicleStatus> {
        normalize_ev_status(serde_json::from_value(value).unwrap())
    }

    #[rstest]
    #[case(Some(1), 35.5, -35.5)]
    #[case(Some(0), 35.5, 35.5)]
    #[case(Some(2), 35.5, 35.5)]
    #[case(None, 35.5, 35.5)]
    fn test_latitude_sign(#[case] flag: Option<i64>, #[case] raw: f64, #[case] expected: f64) {
        assert_eq!(signed_latitude(raw, flag), expected);
    }

    #[rstest]
    #[case(Some(1), 139.7, 139.7)]
    #[case(Some(0), 139.7, -139.7)]
    #[case(Some(2), 139.7, -139.7)]
    #[case(None, 139.7, -139.7)]
    fn test_longitude_sign(#[case] flag: Option<i64>, #[case] raw: f64, #[case] expected: f64) {
        assert_eq!(signed_longitude(raw, flag), expected);
    }

    #[test]
    fn test_parse_vendor_timestamp() {
        let ts = parse_vendor_timestamp("20231105143015").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 11, 5, 14, 30, 15).unwrap());
    }

    #[rstest]
    #[case("")]
    #[case("2023-11-05 14:30:15")]
    #[case("20231345143015")]
    fn test_parse_vendor_timestamp_rejects_garbage(#[case] value: &str) {
        let err = parse_vendor_timestamp(value).unwrap_err();
        assert!(matches!(err, MazdaError::MalformedResponse(_)));
    }

    #[test]
    fn test_full_status_payload() {
        let result = status(json!({
            "alertInfos": [{
                "OccurrenceDate": "20231105143015",
                "Door": {
                    "DrStatDrv": 1, "DrStatPsngr": 0, "DrStatRl": 0, "DrStatRr": 0,
                    "DrStatTrnkLg": 0, "DrStatHood": 0, "FuelLidOpenStatus": 0,
                    "LockLinkSwDrv": 0, "LockLinkSwPsngr": 0,
                    "LockLinkSwRl": 0, "LockLinkSwRr": 0
                },
                "Pw": { "PwPosDrv": 0, "PwPosPsngr": 1, "PwPosRl": 0, "PwPosRr": 0 },
                "HazardLamp": { "HazardSw": 1 }
            }],
            "remoteInfos": [{
                "PositionInfo": {
                    "Latitude": 35.6, "LatitudeFlag": 0,
                    "Longitude": 139.7, "LongitudeFlag": 1,
                    "AcquisitionDatetime": "20231105142900"
                },
                "ResidualFuel": { "FuelSegementDActl": 80.0, "RemDrvDistDActlKm": 412.5 },
                "DriveInformation": { "OdoDispValue": 12345.6 },
                "TPMSInformation": {
                    "FLTPrsDispPsi": 35.0, "FRTPrsDispPsi": 35.5,
                    "RLTPrsDispPsi": 34.0, "RRTPrsDispPsi": 34.5
                }
            }]
        }))
        .unwrap();

        assert_eq!(result.last_updated_timestamp.as_deref(), Some("20231105143015"));
        assert_eq!(result.latitude, Some(35.6));
        assert_eq!(result.longitude, Some(139.7));
        assert_eq!(result.position_timestamp.as_deref(), Some("20231105142900"));
        assert_eq!(result.fuel_remaining_percent, Some(80.0));
        assert_eq!(result.fuel_distance_remaining_km, Some(412.5));
        assert_eq!(result.odometer_km, Some(12345.6));
        assert_eq!(
            result.doors,
            Doors {
                driver_door_open: true,
                ..Default::default()
            }
        );
        assert!(result.door_locks.all_locked());
        assert!(result.windows.passenger_window_open);
        assert!(!result.windows.driver_window_open);
        assert!(result.hazard_lights_on);
        assert_eq!(result.tire_pressure.rear_right_tire_pressure_psi, Some(34.5));
    }

    #[test]
    fn test_sparse_status_payload_is_null_safe() {
        let result = status(json!({
            "alertInfos": [{ "Door": {} }],
            "remoteInfos": [{ "PositionInfo": { "Longitude": 10.0 } }]
        }))
        .unwrap();

        assert_eq!(result.last_updated_timestamp, None);
        assert_eq!(result.latitude, None);
        assert_eq!(result.longitude, Some(-10.0));
        assert_eq!(result.odometer_km, None);
        assert_eq!(result.doors, Doors::default());
        assert_eq!(result.tire_pressure, TirePressure::default());
        assert!(!result.hazard_lights_on);
    }

    #[rstest]
    #[case(json!(1), true)]
    #[case(json!(1.0), true)]
    #[case(json!(0.0), false)]
    #[case(json!("1"), false)]
    #[case(json!({ "open": true }), false)]
    fn test_status_codes_of_any_json_type(#[case] code: serde_json::Value, #[case] set: bool) {
        let result = status(json!({
            "alertInfos": [{ "OccurrenceDate": "20240301120000", "Door": { "DrStatDrv": code.clone() } }],
            "remoteInfos": [{ "PositionInfo": { "Latitude": 35.0, "LatitudeFlag": code } }]
        }))
        .unwrap();

        assert_eq!(result.doors.driver_door_open, set);
        assert_eq!(result.latitude, Some(if set { -35.0 } else { 35.0 }));
    }

    #[test]
    fn test_status_without_alert_infos_is_malformed() {
        let err = status(json!({ "alertInfos": [], "remoteInfos": [{}] })).unwrap_err();
        assert!(matches!(err, MazdaError::MalformedResponse(_)));

        let err = status(json!({ "alertInfos": [{}] })).unwrap_err();
        assert!(matches!(err, MazdaError::MalformedResponse(_)));
    }

    #[test]
    fn test_unlock_flags_use_sentinel_one() {
        let result = status(json!({
            "alertInfos": [{ "Door": { "LockLinkSwRl": 1, "LockLinkSwDrv": 2 } }],
            "remoteInfos": [{}]
        }))
        .unwrap();

        assert!(!result.door_locks.driver_door_unlocked);
        assert!(result.door_locks.rear_left_door_unlocked);
        assert!(!result.door_locks.all_locked());
    }

    #[test]
    fn test_ev_status_payload() {
        let result = ev_status(json!({
            "resultData": [{
                "OccurrenceDate": "20231105143015",
                "PlusBInformation": {
                    "VehicleInfo": {
                        "ChargeInfo": {
                            "SmaphSOC": 78,
                            "SmaphRemDrvDistKm": 152.0,
                            "ChargerConnectorFitting": 1,
                            "ChargeStatusSub": 6,
                            "MaxChargeMinuteAC": 300,
                            "MaxChargeMinuteQBC": 40,
                            "CstmzStatBatHeatAutoSW": 1,
                            "BatteryHeaterON": 0
                        },
                        "RemoteHvacInfo": {
                            "HVAC": 1, "FrontDefroster": 0, "RearDefogger": 1, "InCarTeDC": 21.5
                        }
                    }
                }
            }]
        }))
        .unwrap();

        assert_eq!(
            result.charge_info,
            ChargeInfo {
                last_updated_timestamp: Some("20231105143015".to_string()),
                battery_level_percentage: Some(78.0),
                driving_range_km: Some(152.0),
                plugged_in: true,
                charging: true,
                basic_charge_time_minutes: Some(300.0),
                quick_charge_time_minutes: Some(40.0),
                battery_heater_auto: true,
                battery_heater_on: false,
            }
        );
        assert_eq!(
            result.hvac_info,
            HvacInfo {
                hvac_on: true,
                front_defroster: false,
                rear_defroster: true,
                interior_temperature_celsius: Some(21.5),
            }
        );
    }

    #[rstest]
    #[case(6, true)]
    #[case(1, false)]
    #[case(0, false)]
    fn test_charging_sentinel_is_six(#[case] code: i64, #[case] charging: bool) {
        let result = ev_status(json!({
            "resultData": [{
                "PlusBInformation": { "VehicleInfo": { "ChargeInfo": { "ChargeStatusSub": code } } }
            }]
        }))
        .unwrap();
        assert_eq!(result.charge_info.charging, charging);
    }

    #[test]
    fn test_ev_status_sparse_and_missing() {
        let result = ev_status(json!({ "resultData": [{}] })).unwrap();
        assert_eq!(result.charge_info.battery_level_percentage, None);
        assert!(!result.charge_info.plugged_in);
        assert!(!result.hvac_info.hvac_on);

        let err = ev_status(json!({})).unwrap_err();
        assert!(matches!(err, MazdaError::MalformedResponse(_)));
    }

    #[rstest]
    #[case(json!({ "hvacSettings": { "Temperature": 22.0, "TemperatureType": 1, "FrontDefroster": 1, "RearDefogger": 0 } }),
        HvacSetting { temperature: Some(22.0), temperature_unit: TemperatureUnit::Celsius, front_defroster: true, rear_defroster: false })]
    #[case(json!({ "hvacSettings": { "Temperature": 72.0, "TemperatureType": 2, "RearDefogger": 1 } }),
        HvacSetting { temperature: Some(72.0), temperature_unit: TemperatureUnit::Fahrenheit, front_defroster: false, rear_defroster: true })]
    #[case(json!({}),
        HvacSetting { temperature: None, temperature_unit: TemperatureUnit::Fahrenheit, front_defroster: false, rear_defroster: false })]
    fn test_hvac_setting(#[case] raw: serde_json::Value, #[case] expected: HvacSetting) {
        let setting = normalize_hvac_setting(serde_json::from_value(raw).unwrap());
        assert_eq!(setting, expected);
    }
}

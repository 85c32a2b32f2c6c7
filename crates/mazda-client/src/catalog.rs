//! Vehicle catalog normalization
//!
//! Turns the index-aligned `vecBaseInfos` / `vehicleFlags` lists into
//! [`Vehicle`] records. Vehicles that are not enrolled in connected services
//! are dropped here and never reach higher layers.

use std::future::Future;

use tracing::debug;

use crate::error::{MazdaError, Result};
use crate::raw::{RawOtherInformation, RawVecBaseInfo, RawVehicleFlags, RawVehicleInformation};
use crate::types::Vehicle;

/// `vinRegistStatus` value of a vehicle actively enrolled in connected services
pub const ENROLLED_STATUS: i64 = 3;

/// `econnectType` value of an electric vehicle
pub const ELECTRIC_CONNECT_TYPE: i64 = 1;

/// Pair base-info records with their flags and keep the enrolled ones
///
/// The two lists are aligned by position, so a length mismatch is rejected
/// rather than risking a silent misalignment.
pub fn enrolled_records(
    base_infos: Vec<RawVecBaseInfo>,
    flags: Vec<RawVehicleFlags>,
) -> Result<Vec<RawVecBaseInfo>> {
    if base_infos.len() != flags.len() {
        return Err(MazdaError::InputContract(format!(
            "{} base-info records but {} vehicle flags",
            base_infos.len(),
            flags.len()
        )));
    }

    Ok(base_infos
        .into_iter()
        .zip(flags)
        .filter_map(|(info, flag)| {
            if flag.vin_regist_status == Some(ENROLLED_STATUS) {
                Some(info)
            } else {
                debug!(
                    vin = ?info.vin,
                    status = ?flag.vin_regist_status,
                    "Skipping vehicle not enrolled in connected services"
                );
                None
            }
        })
        .collect())
}

/// Decode the JSON document embedded in `Vehicle.vehicleInformation`
///
/// An absent document yields empty information; a present but unparsable
/// one is a malformed response.
pub fn parse_vehicle_information(record: &RawVecBaseInfo) -> Result<RawOtherInformation> {
    let Some(encoded) = record
        .vehicle
        .as_ref()
        .and_then(|v| v.vehicle_information.as_deref())
    else {
        return Ok(RawOtherInformation::default());
    };

    let info: RawVehicleInformation = serde_json::from_str(encoded).map_err(|e| {
        MazdaError::malformed(format!("invalid vehicleInformation document: {}", e))
    })?;

    Ok(info.other_information.unwrap_or_default())
}

/// Build a [`Vehicle`] from an enrolled record, its decoded information and
/// the nickname looked up for it
pub fn build_vehicle(
    record: RawVecBaseInfo,
    info: RawOtherInformation,
    nickname: String,
) -> Result<Vehicle> {
    let vin = record
        .vin
        .ok_or_else(|| MazdaError::malformed("enrolled vehicle without vin"))?;
    let id = record
        .vehicle
        .and_then(|v| v.cv_information)
        .and_then(|cv| cv.internal_vin)
        .map(|id| id.into_string())
        .ok_or_else(|| MazdaError::malformed(format!("vehicle {} has no internalVin", vin)))?;

    Ok(Vehicle {
        vin,
        id,
        nickname,
        carline_code: info.carline_code,
        carline_name: info.carline_name,
        model_year: info.model_year.map(|y| y.into_string()),
        model_code: info.model_code,
        model_name: info.model_name,
        automatic_transmission: info.transmission_type.as_deref() == Some("A"),
        interior_color_code: info.interior_color_code,
        interior_color_name: info.interior_color_name,
        exterior_color_code: info.exterior_color_code,
        exterior_color_name: info.exterior_color_name,
        is_electric: record.econnect_type == Some(ELECTRIC_CONNECT_TYPE),
    })
}

/// Normalize the whole catalog
///
/// `nickname_lookup` is awaited once per enrolled vehicle, one at a time, so
/// the output order matches the input order.
pub async fn normalize_vehicles<F, Fut>(
    base_infos: Vec<RawVecBaseInfo>,
    flags: Vec<RawVehicleFlags>,
    mut nickname_lookup: F,
) -> Result<Vec<Vehicle>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let records = enrolled_records(base_infos, flags)?;
    let mut vehicles = Vec::with_capacity(records.len());

    for record in records {
        let info = parse_vehicle_information(&record)?;
        let vin = record
            .vin
            .clone()
            .ok_or_else(|| MazdaError::malformed("enrolled vehicle without vin"))?;
        let nickname = nickname_lookup(vin).await?;
        vehicles.push(build_vehicle(record, info, nickname)?);
    }

    Ok(vehicles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{base_info_json, vehicle_flags_json};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn records(values: Vec<serde_json::Value>) -> Vec<RawVecBaseInfo> {
        serde_json::from_value(serde_json::Value::Array(values)).unwrap()
    }

    fn flags(statuses: &[i64]) -> Vec<RawVehicleFlags> {
        statuses
            .iter()
            .map(|s| serde_json::from_value(vehicle_flags_json(*s)).unwrap())
            .collect()
    }

    #[test]
    fn test_only_enrolled_vehicles_are_kept() {
        let infos = records(vec![
            base_info_json("JM3KFBCM1L0000001", "1001", 1),
            base_info_json("JM3KFBCM1L0000002", "1002", 0),
        ]);

        let kept = enrolled_records(infos, flags(&[3, 1])).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].vin.as_deref(), Some("JM3KFBCM1L0000001"));
    }

    #[test]
    fn test_non_enrolled_statuses_are_dropped() {
        for status in [0, 1, 2, 4, -1] {
            let infos = records(vec![base_info_json("VIN", "1", 1)]);
            let kept = enrolled_records(infos, flags(&[status])).unwrap();
            assert!(kept.is_empty(), "status {} should be filtered", status);
        }
    }

    #[test]
    fn test_missing_flag_value_is_dropped() {
        let infos = records(vec![base_info_json("VIN", "1", 1)]);
        let kept = enrolled_records(infos, vec![RawVehicleFlags::default()]).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let infos = records(vec![
            base_info_json("VIN1", "1", 1),
            base_info_json("VIN2", "2", 1),
        ]);

        let err = enrolled_records(infos, flags(&[3])).unwrap_err();
        assert!(matches!(err, MazdaError::InputContract(_)));
    }

    #[test]
    fn test_build_vehicle_extracts_descriptive_fields() {
        let record: RawVecBaseInfo =
            serde_json::from_value(base_info_json("JM3KFBCM1L0000001", "1001", 1)).unwrap();
        let info = parse_vehicle_information(&record).unwrap();
        let vehicle = build_vehicle(record, info, "My MX-30".to_string()).unwrap();

        assert_eq!(
            vehicle,
            Vehicle {
                vin: "JM3KFBCM1L0000001".to_string(),
                id: "1001".to_string(),
                nickname: "My MX-30".to_string(),
                carline_code: Some("MX30".to_string()),
                carline_name: Some("MX-30".to_string()),
                model_year: Some("2021".to_string()),
                model_code: Some("DRH1".to_string()),
                model_name: Some("MX-30 EV".to_string()),
                automatic_transmission: true,
                interior_color_code: Some("BY3".to_string()),
                interior_color_name: Some("BLACK".to_string()),
                exterior_color_code: Some("51K".to_string()),
                exterior_color_name: Some("CERAMIC".to_string()),
                is_electric: true,
            }
        );
    }

    #[test]
    fn test_absent_information_yields_nulls() {
        let record: RawVecBaseInfo = serde_json::from_value(json!({
            "vin": "VIN",
            "econnectType": 0,
            "Vehicle": { "CvInformation": { "internalVin": 42 } }
        }))
        .unwrap();
        let info = parse_vehicle_information(&record).unwrap();
        let vehicle = build_vehicle(record, info, String::new()).unwrap();

        assert_eq!(vehicle.id, "42");
        assert_eq!(vehicle.carline_name, None);
        assert_eq!(vehicle.model_year, None);
        assert!(!vehicle.automatic_transmission);
        assert!(!vehicle.is_electric);
    }

    #[test]
    fn test_unparsable_information_is_malformed() {
        let record: RawVecBaseInfo = serde_json::from_value(json!({
            "vin": "VIN",
            "Vehicle": {
                "CvInformation": { "internalVin": "1" },
                "vehicleInformation": "{not json"
            }
        }))
        .unwrap();

        let err = parse_vehicle_information(&record).unwrap_err();
        assert!(matches!(err, MazdaError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_normalize_looks_up_nicknames_in_order() {
        let infos = records(vec![
            base_info_json("VIN_A", "1", 1),
            base_info_json("VIN_B", "2", 0),
            base_info_json("VIN_C", "3", 1),
        ]);

        let mut looked_up = Vec::new();
        let vehicles = normalize_vehicles(infos, flags(&[3, 1, 3]), |vin| {
            looked_up.push(vin.clone());
            async move { Ok(format!("nick-{}", vin)) }
        })
        .await
        .unwrap();

        assert_eq!(looked_up, vec!["VIN_A", "VIN_C"]);
        let nicknames: Vec<_> = vehicles.iter().map(|v| v.nickname.as_str()).collect();
        assert_eq!(nicknames, vec!["nick-VIN_A", "nick-VIN_C"]);
    }

    #[tokio::test]
    async fn test_nickname_failure_propagates() {
        let infos = records(vec![base_info_json("VIN_A", "1", 1)]);

        let result = normalize_vehicles(infos, flags(&[3]), |_| async {
            Err(MazdaError::Timeout)
        })
        .await;
        assert!(matches!(result, Err(MazdaError::Timeout)));
    }
}

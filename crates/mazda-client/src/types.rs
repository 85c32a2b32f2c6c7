//! Normalized vehicle and status types

use serde::{Deserialize, Serialize};

// =============================================================================
// Vehicle Catalog
// =============================================================================

/// A vehicle enrolled in connected services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub vin: String,
    /// Opaque identifier used for every per-vehicle API call
    pub id: String,
    pub nickname: String,
    #[serde(default)]
    pub carline_code: Option<String>,
    #[serde(default)]
    pub carline_name: Option<String>,
    #[serde(default)]
    pub model_year: Option<String>,
    #[serde(default)]
    pub model_code: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    pub automatic_transmission: bool,
    #[serde(default)]
    pub interior_color_code: Option<String>,
    #[serde(default)]
    pub interior_color_name: Option<String>,
    #[serde(default)]
    pub exterior_color_code: Option<String>,
    #[serde(default)]
    pub exterior_color_name: Option<String>,
    pub is_electric: bool,
}

// =============================================================================
// Vehicle Status
// =============================================================================

/// Snapshot of a vehicle's remote status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatus {
    /// Vendor timestamp, `YYYYMMDDHHMMSS` in UTC
    pub last_updated_timestamp: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub position_timestamp: Option<String>,
    pub fuel_remaining_percent: Option<f64>,
    pub fuel_distance_remaining_km: Option<f64>,
    pub odometer_km: Option<f64>,
    pub doors: Doors,
    pub door_locks: DoorLocks,
    pub windows: Windows,
    pub hazard_lights_on: bool,
    pub tire_pressure: TirePressure,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doors {
    pub driver_door_open: bool,
    pub passenger_door_open: bool,
    pub rear_left_door_open: bool,
    pub rear_right_door_open: bool,
    pub trunk_open: bool,
    pub hood_open: bool,
    pub fuel_lid_open: bool,
}

/// Door lock flags; `true` means the door is unlocked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorLocks {
    pub driver_door_unlocked: bool,
    pub passenger_door_unlocked: bool,
    pub rear_left_door_unlocked: bool,
    pub rear_right_door_unlocked: bool,
}

impl DoorLocks {
    /// The vehicle counts as locked iff no door reports unlocked
    pub fn all_locked(&self) -> bool {
        !(self.driver_door_unlocked
            || self.passenger_door_unlocked
            || self.rear_left_door_unlocked
            || self.rear_right_door_unlocked)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Windows {
    pub driver_window_open: bool,
    pub passenger_window_open: bool,
    pub rear_left_window_open: bool,
    pub rear_right_window_open: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TirePressure {
    pub front_left_tire_pressure_psi: Option<f64>,
    pub front_right_tire_pressure_psi: Option<f64>,
    pub rear_left_tire_pressure_psi: Option<f64>,
    pub rear_right_tire_pressure_psi: Option<f64>,
}

// =============================================================================
// EV Status
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvVehicleStatus {
    pub charge_info: ChargeInfo,
    pub hvac_info: HvacInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeInfo {
    pub last_updated_timestamp: Option<String>,
    /// State of charge, 0-100
    pub battery_level_percentage: Option<f64>,
    pub driving_range_km: Option<f64>,
    pub plugged_in: bool,
    pub charging: bool,
    pub basic_charge_time_minutes: Option<f64>,
    pub quick_charge_time_minutes: Option<f64>,
    pub battery_heater_auto: bool,
    pub battery_heater_on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HvacInfo {
    pub hvac_on: bool,
    pub front_defroster: bool,
    pub rear_defroster: bool,
    pub interior_temperature_celsius: Option<f64>,
}

// =============================================================================
// HVAC Settings
// =============================================================================

/// Temperature unit of an HVAC setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Vendor `TemperatureType` code
    pub fn as_vendor_code(&self) -> i64 {
        match self {
            Self::Celsius => 1,
            Self::Fahrenheit => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HvacSetting {
    pub temperature: Option<f64>,
    pub temperature_unit: TemperatureUnit,
    pub front_defroster: bool,
    pub rear_defroster: bool,
}

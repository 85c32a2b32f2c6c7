//! Lock-state bookkeeping
//!
//! Lock and unlock commands take a while to show up in the status API. The
//! reconciler remembers the state a command is expected to produce and
//! prefers it over the API-reported state while it is both newer than the
//! last API snapshot and younger than [`ASSUMED_STATE_TTL_SECS`].

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// How long an assumed lock state may override the API-reported one
pub const ASSUMED_STATE_TTL_SECS: i64 = 600;

/// Per-vehicle lock-state record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachedVehicleState {
    /// `lastUpdatedTimestamp` of the last status fetch
    pub api_timestamp: Option<DateTime<Utc>>,
    /// Locked according to the last status fetch
    pub api_lock_state: Option<bool>,
    /// Locked according to the last issued command
    pub assumed_lock_state: Option<bool>,
    /// When the last lock or unlock command was issued
    pub assumed_lock_state_timestamp: Option<DateTime<Utc>>,
}

/// Cache of [`CachedVehicleState`] keyed by internal vehicle id
///
/// Entries are created on first write and live as long as the reconciler.
/// Mutation goes through `&mut self`, so one owner writes at a time.
#[derive(Debug, Default)]
pub struct LockStateReconciler {
    states: HashMap<String, CachedVehicleState>,
}

impl LockStateReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, vehicle_id: &str) -> &mut CachedVehicleState {
        self.states.entry(vehicle_id.to_string()).or_default()
    }

    /// Record the state a lock (`true`) or unlock (`false`) command will produce
    pub fn record_command(&mut self, vehicle_id: &str, locked: bool) {
        self.record_command_at(vehicle_id, locked, Utc::now());
    }

    /// [`record_command`](Self::record_command) with an explicit clock
    pub fn record_command_at(&mut self, vehicle_id: &str, locked: bool, at: DateTime<Utc>) {
        debug!(vehicle_id, locked, "Assuming lock state after command");
        let state = self.entry(vehicle_id);
        state.assumed_lock_state = Some(locked);
        state.assumed_lock_state_timestamp = Some(at);
    }

    /// Record the lock state reported by a status fetch
    pub fn record_api_state(&mut self, vehicle_id: &str, locked: bool, at: DateTime<Utc>) {
        let state = self.entry(vehicle_id);
        state.api_lock_state = Some(locked);
        state.api_timestamp = Some(at);
    }

    /// Best guess of the current lock state, `None` when nothing is known
    pub fn assumed_lock_state(&self, vehicle_id: &str) -> Option<bool> {
        self.assumed_lock_state_at(vehicle_id, Utc::now())
    }

    /// [`assumed_lock_state`](Self::assumed_lock_state) evaluated at `now`
    pub fn assumed_lock_state_at(&self, vehicle_id: &str, now: DateTime<Utc>) -> Option<bool> {
        let state = self.states.get(vehicle_id)?;

        match (state.assumed_lock_state, state.api_lock_state) {
            (None, None) => None,
            (Some(assumed), None) => Some(assumed),
            (None, Some(api)) => Some(api),
            (Some(assumed), Some(api)) => {
                let assumption_current = match (
                    state.assumed_lock_state_timestamp,
                    state.api_timestamp,
                ) {
                    (Some(assumed_at), Some(api_at)) => {
                        assumed_at > api_at
                            && now - assumed_at < Duration::seconds(ASSUMED_STATE_TTL_SECS)
                    }
                    _ => false,
                };

                Some(if assumption_current { assumed } else { api })
            }
        }
    }

    /// Raw cache entry for a vehicle
    pub fn state(&self, vehicle_id: &str) -> Option<&CachedVehicleState> {
        self.states.get(vehicle_id)
    }
}

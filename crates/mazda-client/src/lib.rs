//! Mazda connected-services client
//!
//! Reads vehicles and their status from the Mazda connected-services API and
//! normalizes the vendor's nested JSON into plain Rust types.
//!
//! # Example
//!
//! ```rust,no_run
//! use mazda_client::{ClientConfig, MazdaClient, Region};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::builder("driver@example.com", "secret", Region::Mme).build()?;
//!     let mut client = MazdaClient::new(config)?;
//!
//!     if let Some(vehicle) = client.find_vehicle("JM3KFBCM1L0000001").await? {
//!         let ev = client.get_ev_vehicle_status(&vehicle.id).await?;
//!         println!("SoC: {:?}", ev.charge_info.battery_level_percentage);
//!     }
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Lock state
//!
//! Lock and unlock commands are not visible in the status API right away.
//! [`MazdaClient::get_assumed_lock_state`] combines the last reported state
//! with the state the last command is expected to produce:
//!
//! ```rust
//! # use std::sync::Arc;
//! # use mazda_client::{testing::FakeController, MazdaClient};
//! # tokio_test::block_on(async {
//! let mut client = MazdaClient::with_controller(Arc::new(FakeController::new()), false);
//! client.lock_doors("1001").await.unwrap();
//! assert_eq!(client.get_assumed_lock_state("1001"), Some(true));
//! # });
//! ```
//!
//! # Testing
//!
//! The `testing` module provides a [`FakeController`](testing::FakeController)
//! with canned payloads and a [`TestServer`](testing::TestServer) that runs
//! an axum router in front of a real [`HttpController`].

pub mod catalog;
mod client;
mod config;
pub mod controller;
mod error;
pub mod lock_state;
pub mod raw;
pub mod status;
pub mod testing;
mod types;

pub use client::MazdaClient;
pub use config::{ClientConfig, ClientConfigBuilder, Region, TimeoutsConfig};
pub use controller::{Controller, HttpController};
pub use error::{MazdaError, Result};
pub use lock_state::{CachedVehicleState, LockStateReconciler};
pub use types::*;

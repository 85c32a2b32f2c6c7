//! Client configuration
//!
//! Can be deserialized (e.g. from TOML) or constructed with the builder:
//!
//! ```rust
//! use mazda_client::{ClientConfig, Region};
//!
//! let config = ClientConfig::builder("driver@example.com", "secret", Region::Mme)
//!     .use_cached_vehicle_list(true)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.api_base_url(), "https://e9stj7g7.mazda.com/prod/");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MazdaError, Result};

/// API region of the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// North America
    #[serde(rename = "MNAO")]
    Mnao,
    /// Europe
    #[serde(rename = "MME")]
    Mme,
    /// Japan
    #[serde(rename = "MJO")]
    Mjo,
}

impl Region {
    /// Region code as used on the command line
    pub fn code(&self) -> &'static str {
        match self {
            Self::Mnao => "MNAO",
            Self::Mme => "MME",
            Self::Mjo => "MJO",
        }
    }

    /// Default API base URL for the region
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Mnao => "https://0cxo7m58.mazda.com/prod/",
            Self::Mme => "https://e9stj7g7.mazda.com/prod/",
            Self::Mjo => "https://wcs9p6wj.mazda.com/prod/",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = MazdaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MNAO" => Ok(Self::Mnao),
            "MME" => Ok(Self::Mme),
            "MJO" => Ok(Self::Mjo),
            other => Err(MazdaError::Config(format!(
                "Unknown region '{}' (expected MNAO, MME or MJO)",
                other
            ))),
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Request timeout in milliseconds (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_ms: u64,

    /// Connect timeout in milliseconds (default: 10s)
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            request_ms: default_request_timeout(),
            connect_ms: default_connect_timeout(),
        }
    }
}

impl TimeoutsConfig {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_connect_timeout() -> u64 {
    10_000
}

/// Everything needed to talk to the connected-services API
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Account email address
    pub email: String,
    pub password: String,
    pub region: Region,

    /// Overrides the region's default API base URL
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Fetch the vehicle list once and serve it from memory afterwards
    #[serde(default)]
    pub use_cached_vehicle_list: bool,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("region", &self.region)
            .field("base_url", &self.base_url)
            .field("timeouts", &self.timeouts)
            .field("use_cached_vehicle_list", &self.use_cached_vehicle_list)
            .finish()
    }
}

impl ClientConfig {
    /// Create a builder for programmatic configuration
    pub fn builder(
        email: impl Into<String>,
        password: impl Into<String>,
        region: Region,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder::new(email, password, region)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| MazdaError::Config(format!("Invalid client config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty credentials
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(MazdaError::Config(
                "Invalid or missing email address".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(MazdaError::Config("Invalid or missing password".to_string()));
        }
        Ok(())
    }

    /// Base URL requests are sent to
    pub fn api_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.region.base_url())
    }
}

/// Builder for ClientConfig
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(email: impl Into<String>, password: impl Into<String>, region: Region) -> Self {
        Self {
            config: ClientConfig {
                email: email.into(),
                password: password.into(),
                region,
                base_url: None,
                timeouts: TimeoutsConfig::default(),
                use_cached_vehicle_list: false,
            },
        }
    }

    /// Override the API base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set request timeout in milliseconds
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.request_ms = ms;
        self
    }

    /// Set connect timeout in milliseconds
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.connect_ms = ms;
        self
    }

    pub fn use_cached_vehicle_list(mut self, enabled: bool) -> Self {
        self.config.use_cached_vehicle_list = enabled;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

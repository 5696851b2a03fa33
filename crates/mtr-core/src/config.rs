//! Configuration types for report construction
//!
//! This module defines all configuration structures used by the
//! [`ReportBuilder`](crate::ReportBuilder).

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

/// mtr's own default for `-c`
const DEFAULT_ROUNDS: NonZeroU32 = match NonZeroU32::new(10) {
    Some(rounds) => rounds,
    None => unreachable!(),
};

/// Main report configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Probe invocation settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Hostname and organization lookup settings
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl ReportConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.probe.validate()?;
        self.identity.validate()?;
        Ok(())
    }
}

/// Probe invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Probe binary, looked up on `PATH` unless absolute
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Number of probe rounds (`-c`), also the `sent` count of every hop
    #[serde(default = "default_rounds")]
    pub rounds: u32,
}

impl ProbeConfig {
    /// Validate the probe configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.binary.trim().is_empty() {
            return Err(crate::Error::config("Probe binary cannot be empty"));
        }
        if self.rounds == 0 {
            return Err(crate::Error::config("Probe rounds must be > 0"));
        }
        Ok(())
    }

    /// Round count as a non-zero value
    ///
    /// Falls back to the default when called on an unvalidated config with
    /// zero rounds.
    pub fn rounds(&self) -> NonZeroU32 {
        NonZeroU32::new(self.rounds).unwrap_or(DEFAULT_ROUNDS)
    }

    /// Set the probe binary
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the round count
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            rounds: default_rounds(),
        }
    }
}

/// Identity resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Whether to reverse-resolve hop addresses at all
    #[serde(default = "default_reverse_dns")]
    pub reverse_dns: bool,

    /// Per-lookup timeout (in milliseconds)
    ///
    /// Applies to each reverse-DNS and each organization lookup separately.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// Maximum lookups running at once
    ///
    /// Lookups that time out keep running in the background until they
    /// finish and still count against this limit.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl IdentityConfig {
    /// Validate the identity configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.lookup_timeout_ms == 0 {
            return Err(crate::Error::config("Lookup timeout must be > 0"));
        }
        if self.max_in_flight == 0 {
            return Err(crate::Error::config("Maximum in-flight lookups must be > 0"));
        }
        Ok(())
    }

    /// Per-lookup timeout
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            reverse_dns: default_reverse_dns(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_binary() -> String {
    "mtr".to_string()
}

fn default_rounds() -> u32 {
    DEFAULT_ROUNDS.get()
}

fn default_reverse_dns() -> bool {
    true
}

fn default_lookup_timeout_ms() -> u64 {
    1000
}

fn default_max_in_flight() -> usize {
    32
}

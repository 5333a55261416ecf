//! Configuration types for the bridge.
//!
//! [`BridgeConfig`] is the top-level configuration loaded from
//! `ymdeck.toml`. It controls where the player's debugging endpoint lives,
//! how the connection recovers from drops, how often each capability is
//! polled, and how track text scrolls. The host's `debugPort` global
//! setting overrides `debug_port` at runtime.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BridgeError, Capability};

/// File name of the plugin-local configuration file.
pub const CONFIG_FILENAME: &str = "ymdeck.toml";

/// Port the player exposes its remote debugging interface on by default.
pub const DEFAULT_DEBUG_PORT: u16 = 9222;

/// Host the debugging interface is reached on.
pub const DEFAULT_DEBUG_HOST: &str = "127.0.0.1";

/// Reconnect policy applied after the transport reports a disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Maximum scheduled attempts before giving up until the next use.
    pub max_attempts: u32,
    /// Attempt `n` waits `n * base_delay_ms` milliseconds.
    pub base_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl ReconnectConfig {
    /// Delay before the given 1-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Tick intervals per capability, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub playback_ms: u64,
    pub like_ms: u64,
    pub mute_ms: u64,
    pub track_info_ms: u64,
    pub cover_ms: u64,
    pub time_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            playback_ms: 100,
            like_ms: 100,
            mute_ms: 100,
            track_info_ms: 100,
            cover_ms: 1000,
            time_ms: 500,
        }
    }
}

impl PollingConfig {
    /// Interval for one capability's poller.
    pub fn interval(&self, capability: Capability) -> Duration {
        let ms = match capability {
            Capability::PlayPause => self.playback_ms,
            Capability::Like => self.like_ms,
            Capability::Mute => self.mute_ms,
            Capability::Cover => self.cover_ms,
            Capability::TrackInfo => self.track_info_ms,
            Capability::TrackTime => self.time_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Scrolling text settings for track-info buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarqueeConfig {
    /// Number of characters visible at once.
    pub window: usize,
    /// Characters advanced per tick; fractional steps slow the scroll.
    pub step: f64,
}

impl Default for MarqueeConfig {
    fn default() -> Self {
        Self {
            window: 10,
            step: 0.5,
        }
    }
}

/// Top-level configuration for a bridge instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Host the player's debugging endpoint listens on.
    pub debug_host: String,
    /// Port the player's debugging endpoint listens on.
    pub debug_port: u16,
    /// Directory for daily log files; `None` means `./log`.
    pub log_dir: Option<PathBuf>,
    pub reconnect: ReconnectConfig,
    pub polling: PollingConfig,
    pub marquee: MarqueeConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            debug_host: DEFAULT_DEBUG_HOST.to_string(),
            debug_port: DEFAULT_DEBUG_PORT,
            log_dir: None,
            reconnect: ReconnectConfig::default(),
            polling: PollingConfig::default(),
            marquee: MarqueeConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, BridgeError> {
        let config: BridgeConfig =
            toml::from_str(content).map_err(|e| BridgeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, BridgeError> {
        toml::to_string_pretty(self).map_err(|e| BridgeError::Config(e.to_string()))
    }

    /// Directory daily log files are written to.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("log"))
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.debug_host.trim().is_empty() {
            return Err(BridgeError::Config("debug_host cannot be empty".into()));
        }
        validate_port(i64::from(self.debug_port))?;

        for capability in Capability::ALL {
            if self.polling.interval(capability).is_zero() {
                return Err(BridgeError::Config(format!(
                    "polling interval for {capability} must be greater than zero"
                )));
            }
        }

        if self.marquee.window == 0 {
            return Err(BridgeError::Config(
                "marquee.window must be at least 1".into(),
            ));
        }
        if !(self.marquee.step.is_finite() && self.marquee.step > 0.0) {
            return Err(BridgeError::Config(format!(
                "marquee.step must be a positive number, got {}",
                self.marquee.step
            )));
        }

        Ok(())
    }
}

/// Validate a debug port coming from config, env, or the inspector UI.
pub fn validate_port(port: i64) -> Result<u16, BridgeError> {
    if !(1..=65535).contains(&port) {
        return Err(BridgeError::InvalidPort(format!(
            "{port} is out of valid range (1-65535)"
        )));
    }
    u16::try_from(port).map_err(|e| BridgeError::InvalidPort(e.to_string()))
}

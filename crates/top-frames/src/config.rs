//! Pipeline configuration, read from the environment of the host process.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

pub const POLICY_VAR: &str = "TOP_PRODUCER_POLICY";
pub const ACQUIRE_TIMEOUT_VAR: &str = "TOP_ACQUIRE_TIMEOUT_MS";
pub const FRAME_INTERVAL_VAR: &str = "TOP_FRAME_INTERVAL_MS";

/// When the worker produces a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProducerPolicy {
    /// Produce as fast as the source allows, overwriting frames the host
    /// has not collected yet. The host always gets the newest frame.
    #[default]
    Continuous,
    /// Produce one frame per request. The consumer asks for the next frame
    /// after it collects one.
    Signaled,
}

impl FromStr for ProducerPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(Self::Continuous),
            "signaled" | "signalled" => Ok(Self::Signaled),
            _ => Err(()),
        }
    }
}

/// Settings shared by every frame pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub policy: ProducerPolicy,
    /// Upper bound on one blocking `acquire`. Also bounds shutdown latency.
    pub acquire_timeout: Duration,
    /// Pacing of the synthetic source.
    pub frame_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy: ProducerPolicy::Continuous,
            acquire_timeout: Duration::from_millis(2000),
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl PipelineConfig {
    /// Read overrides from `TOP_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`Self::from_env`], logging and falling back to defaults on error.
    pub fn from_env_or_default() -> Self {
        Self::from_env().unwrap_or_else(|err| {
            warn!(error = %err, "invalid pipeline configuration, using defaults");
            Self::default()
        })
    }

    /// Read overrides through `lookup`, starting from the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(POLICY_VAR) {
            config.policy = value.parse().map_err(|()| ConfigError::UnknownPolicy {
                key: POLICY_VAR,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ACQUIRE_TIMEOUT_VAR) {
            config.acquire_timeout = parse_millis(ACQUIRE_TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = lookup(FRAME_INTERVAL_VAR) {
            config.frame_interval = parse_millis(FRAME_INTERVAL_VAR, &value)?;
        }
        Ok(config)
    }

    pub fn with_policy(mut self, policy: ProducerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidMillis {
            key,
            value: value.to_owned(),
        })
}

/// Parse a boolean switch such as `TOP_SYNTHETIC_THREADED`.
pub fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: value.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.policy, ProducerPolicy::Continuous);
        assert_eq!(config.acquire_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn overrides_are_applied() {
        let config = PipelineConfig::from_lookup(lookup(&[
            (POLICY_VAR, "Signaled"),
            (ACQUIRE_TIMEOUT_VAR, "250"),
            (FRAME_INTERVAL_VAR, " 0 "),
        ]))
        .unwrap();
        assert_eq!(config.policy, ProducerPolicy::Signaled);
        assert_eq!(config.acquire_timeout, Duration::from_millis(250));
        assert_eq!(config.frame_interval, Duration::ZERO);
    }

    #[test]
    fn bad_values_are_reported() {
        let err = PipelineConfig::from_lookup(lookup(&[(POLICY_VAR, "sometimes")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPolicy { .. }));
        let err = PipelineConfig::from_lookup(lookup(&[(ACQUIRE_TIMEOUT_VAR, "-5")])).unwrap_err();
        assert!(err.to_string().contains(ACQUIRE_TIMEOUT_VAR));
    }

    #[test]
    fn bool_switches() {
        assert_eq!(parse_bool("K", "off"), Ok(false));
        assert_eq!(parse_bool("K", "TRUE"), Ok(true));
        assert!(parse_bool("K", "maybe").is_err());
    }
}

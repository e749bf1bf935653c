/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Session configuration.
//!
//! This module provides configuration options for venue sessions. A
//! configuration is built programmatically or parsed from a string
//! key-value option set; missing or unparsable required options are
//! fatal at startup.

use gatewire_core::error::ConfigError;
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for a venue session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Venue name, used for logging and store scoping.
    pub venue: String,
    /// Real-time endpoint as `host:port`.
    pub real_time_endpoint: String,
    /// Recovery endpoint as `host:port`, when the venue offers replay.
    pub recovery_endpoint: Option<String>,
    /// Session username.
    pub username: String,
    /// Session password.
    pub password: String,
    /// Heartbeat interval.
    pub heartbeat_interval: Duration,
    /// Whether to reset sequence numbers on start.
    pub reset_sequence_numbers: bool,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Time allowed between connect and logon completion.
    pub logon_timeout: Duration,
    /// Maximum wire frame size in bytes.
    pub max_frame_size: usize,
}

impl SessionConfig {
    /// Creates a new session configuration with required fields.
    ///
    /// # Arguments
    /// * `venue` - Venue name
    /// * `real_time_endpoint` - Real-time endpoint as `host:port`
    /// * `username` - Session username
    /// * `password` - Session password
    #[must_use]
    pub fn new(
        venue: impl Into<String>,
        real_time_endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            venue: venue.into(),
            real_time_endpoint: real_time_endpoint.into(),
            recovery_endpoint: None,
            username: username.into(),
            password: password.into(),
            heartbeat_interval: Duration::from_secs(30),
            reset_sequence_numbers: false,
            connect_timeout: Duration::from_secs(10),
            logon_timeout: Duration::from_secs(10),
            max_frame_size: 64 * 1024,
        }
    }

    /// Sets the recovery endpoint.
    #[must_use]
    pub fn with_recovery_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.recovery_endpoint = Some(endpoint.into());
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets whether to reset sequence numbers on start.
    #[must_use]
    pub const fn with_reset_sequence_numbers(mut self, reset: bool) -> Self {
        self.reset_sequence_numbers = reset;
        self
    }

    /// Sets the connection establishment timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the logon timeout.
    #[must_use]
    pub const fn with_logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout = timeout;
        self
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Parses a configuration from a string key-value option set.
    ///
    /// Required keys: `venue`, `real_time_host`, `username`, `password`.
    /// Optional keys: `recovery_host`, `heartbeat_interval` (seconds),
    /// `reset_sequence_numbers`, `connect_timeout` (seconds),
    /// `logon_timeout` (seconds), `max_frame_size` (bytes).
    ///
    /// # Arguments
    /// * `options` - The option set
    ///
    /// # Errors
    /// Returns `ConfigError` for missing required keys, unparsable
    /// values, or malformed endpoints.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |key: &str| -> Result<String, ConfigError> {
            options
                .get(key)
                .cloned()
                .ok_or_else(|| ConfigError::MissingOption {
                    key: key.to_string(),
                })
        };

        let real_time = required("real_time_host")?;
        check_endpoint(&real_time)?;

        let mut config = Self::new(
            required("venue")?,
            real_time,
            required("username")?,
            required("password")?,
        );

        if let Some(recovery) = options.get("recovery_host") {
            check_endpoint(recovery)?;
            config.recovery_endpoint = Some(recovery.clone());
        }
        if let Some(secs) = options.get("heartbeat_interval") {
            config.heartbeat_interval = Duration::from_secs(parse_u64("heartbeat_interval", secs)?);
        }
        if let Some(value) = options.get("reset_sequence_numbers") {
            config.reset_sequence_numbers = parse_bool("reset_sequence_numbers", value)?;
        }
        if let Some(secs) = options.get("connect_timeout") {
            config.connect_timeout = Duration::from_secs(parse_u64("connect_timeout", secs)?);
        }
        if let Some(secs) = options.get("logon_timeout") {
            config.logon_timeout = Duration::from_secs(parse_u64("logon_timeout", secs)?);
        }
        if let Some(size) = options.get("max_frame_size") {
            config.max_frame_size = parse_u64("max_frame_size", size)? as usize;
        }

        Ok(config)
    }

    /// Returns the heartbeat interval in seconds.
    #[must_use]
    pub fn heartbeat_interval_secs(&self) -> u64 {
        self.heartbeat_interval.as_secs()
    }
}

/// Checks that an endpoint string is a `host:port` pair.
fn check_endpoint(value: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidEndpoint {
        value: value.to_string(),
    };

    let (host, port) = value.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(invalid());
    }
    Ok(())
}

/// Parses an unsigned integer option value.
fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidOption {
        key: key.to_string(),
        reason: format!("'{}' is not an unsigned integer", value),
    })
}

/// Parses a boolean option value.
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidOption {
            key: key.to_string(),
            reason: format!("'{}' is not a boolean", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_session_config_new_defaults() {
        let config = SessionConfig::new("LSE", "127.0.0.1:9000", "user", "pass");
        assert_eq!(config.venue, "LSE");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert!(!config.reset_sequence_numbers);
        assert!(config.recovery_endpoint.is_none());
    }

    #[test]
    fn test_from_options_complete() {
        let opts = options(&[
            ("venue", "LSE"),
            ("real_time_host", "127.0.0.1:9000"),
            ("recovery_host", "127.0.0.1:9001"),
            ("username", "user"),
            ("password", "pass"),
            ("heartbeat_interval", "10"),
            ("reset_sequence_numbers", "yes"),
        ]);

        let config = SessionConfig::from_options(&opts).unwrap();
        assert_eq!(config.recovery_endpoint.as_deref(), Some("127.0.0.1:9001"));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(10));
        assert!(config.reset_sequence_numbers);
    }

    #[test]
    fn test_from_options_missing_required() {
        let opts = options(&[("venue", "LSE"), ("real_time_host", "127.0.0.1:9000")]);
        let err = SessionConfig::from_options(&opts).unwrap_err();
        assert!(matches!(err, ConfigError::MissingOption { key } if key == "username"));
    }

    #[test]
    fn test_from_options_bad_endpoint() {
        let opts = options(&[
            ("venue", "LSE"),
            ("real_time_host", "no-port-here"),
            ("username", "user"),
            ("password", "pass"),
        ]);
        assert!(matches!(
            SessionConfig::from_options(&opts),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_from_options_bad_bool() {
        let opts = options(&[
            ("venue", "LSE"),
            ("real_time_host", "127.0.0.1:9000"),
            ("username", "user"),
            ("password", "pass"),
            ("reset_sequence_numbers", "maybe"),
        ]);
        assert!(matches!(
            SessionConfig::from_options(&opts),
            Err(ConfigError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_builder_style_overrides() {
        let config = SessionConfig::new("XETRA", "127.0.0.1:9000", "u", "p")
            .with_recovery_endpoint("127.0.0.1:9001")
            .with_heartbeat_interval(Duration::from_secs(5))
            .with_reset_sequence_numbers(true)
            .with_max_frame_size(4096);

        assert_eq!(config.recovery_endpoint.as_deref(), Some("127.0.0.1:9001"));
        assert_eq!(config.heartbeat_interval_secs(), 5);
        assert!(config.reset_sequence_numbers);
        assert_eq!(config.max_frame_size, 4096);
    }
}

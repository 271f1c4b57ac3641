//! Desk configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Missing or unparsable values fall
//! back to the defaults documented on each field.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::FilterCriteria;

/// Output format for the tracing subscriber installed by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    Text,
    /// Newline-delimited JSON.
    Json,
}

/// Top-level desk configuration.
///
/// Loaded once at startup via [`DeskConfig::from_env`].
#[derive(Debug, Clone)]
pub struct DeskConfig {
    /// Quiescence window of the filter debounce (default 350 ms).
    pub filter_debounce: Duration,

    /// Pickup location preselected in the filter panel (default `Delhi`).
    pub default_pickup_location: String,

    /// Initial maximum seat count (default 8).
    pub default_max_seats: u32,

    /// Initial maximum daily rental rate (default 10 000).
    pub default_max_rental_rate: f64,

    /// Optional JSON file holding the demo fleet.
    pub fleet_path: Option<PathBuf>,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            filter_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            default_pickup_location: "Delhi".to_string(),
            default_max_seats: 8,
            default_max_rental_rate: 10_000.0,
            fleet_path: None,
            log_format: LogFormat::Text,
        }
    }
}

/// Default debounce window in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 350;

impl DeskConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Used by [`DeskConfig::from_env`]; tests pass a map instead of
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let filter_debounce = Duration::from_millis(parse_value(
            lookup("FILTER_DEBOUNCE_MS"),
            DEFAULT_DEBOUNCE_MS,
        ));
        let default_pickup_location = lookup("DEFAULT_PICKUP_LOCATION")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.default_pickup_location);
        let default_max_seats =
            parse_value(lookup("DEFAULT_MAX_SEATS"), defaults.default_max_seats).max(1);
        let default_max_rental_rate = parse_value(
            lookup("DEFAULT_MAX_RENTAL_RATE"),
            defaults.default_max_rental_rate,
        );
        let default_max_rental_rate = if default_max_rental_rate.is_finite() {
            default_max_rental_rate.max(0.0)
        } else {
            defaults.default_max_rental_rate
        };
        let fleet_path = lookup("FLEET_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            filter_debounce,
            default_pickup_location,
            default_max_seats,
            default_max_rental_rate,
            fleet_path,
            log_format,
        }
    }

    /// Initial filter criteria derived from this configuration.
    #[must_use]
    pub fn filter_defaults(&self) -> FilterCriteria {
        FilterCriteria {
            max_seats: self.default_max_seats,
            max_rental_rate: self.default_max_rental_rate,
            pickup_location: self.default_pickup_location.clone(),
            ..FilterCriteria::default()
        }
    }
}

/// Parses an optional raw value as `T`, returning `default` on missing
/// or invalid values.
fn parse_value<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> DeskConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DeskConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.filter_debounce, Duration::from_millis(350));
        assert_eq!(config.default_pickup_location, "Delhi");
        assert_eq!(config.default_max_seats, 8);
        assert!((config.default_max_rental_rate - 10_000.0).abs() < f64::EPSILON);
        assert!(config.fleet_path.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("FILTER_DEBOUNCE_MS", "500"),
            ("DEFAULT_PICKUP_LOCATION", "Mumbai"),
            ("DEFAULT_MAX_SEATS", "5"),
            ("FLEET_PATH", "/tmp/fleet.json"),
            ("LOG_FORMAT", "json"),
        ]);
        assert_eq!(config.filter_debounce, Duration::from_millis(500));
        assert_eq!(config.default_pickup_location, "Mumbai");
        assert_eq!(config.default_max_seats, 5);
        assert_eq!(config.fleet_path, Some(PathBuf::from("/tmp/fleet.json")));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("FILTER_DEBOUNCE_MS", "soon"),
            ("DEFAULT_MAX_SEATS", "0"),
            ("DEFAULT_MAX_RENTAL_RATE", "-20"),
        ]);
        assert_eq!(config.filter_debounce, Duration::from_millis(350));
        assert_eq!(config.default_max_seats, 1);
        assert!(config.default_max_rental_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn filter_defaults_carry_overrides() {
        let config = config_from(&[("DEFAULT_PICKUP_LOCATION", "Pune")]);
        let criteria = config.filter_defaults();
        assert_eq!(criteria.pickup_location, "Pune");
        assert_eq!(criteria.max_seats, 8);
        assert!(criteria.date_range.start.is_none());
    }
}

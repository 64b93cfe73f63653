//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, intervals, window sizes)
//! - Check that backend URLs parse
//! - Refuse enabled admin endpoints without a real key
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{BackendConfig, GatewayConfig, PLACEHOLDER_API_KEY};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: {value} is outside 0.0..=1.0")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("failover.probe_timeout_secs ({timeout}) must be shorter than probe_interval_secs ({interval})")]
    ProbeTimeoutTooLong { timeout: u64, interval: u64 },

    #[error("admin.api_key must be set when admin endpoints are enabled")]
    MissingApiKey,

    #[error("admin.api_key is still the shipped placeholder")]
    PlaceholderApiKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_backend(&config.search_engine, "search_engine.base_url", &mut errors);
    validate_backend(&config.database, "database.base_url", &mut errors);

    let failover = &config.failover;
    if failover.probe_interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "failover.probe_interval_secs" });
    }
    if failover.probe_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "failover.probe_timeout_secs" });
    } else if failover.probe_interval_secs > 0
        && failover.probe_timeout_secs >= failover.probe_interval_secs
    {
        errors.push(ValidationError::ProbeTimeoutTooLong {
            timeout: failover.probe_timeout_secs,
            interval: failover.probe_interval_secs,
        });
    }
    if failover.window_size == 0 {
        errors.push(ValidationError::Zero { field: "failover.window_size" });
    }

    let thresholds = &failover.thresholds;
    if !(0.0..=1.0).contains(&thresholds.max_error_rate) {
        errors.push(ValidationError::OutOfRange {
            field: "failover.thresholds.max_error_rate",
            value: thresholds.max_error_rate,
        });
    }
    if thresholds.max_consecutive_failures == 0 {
        errors.push(ValidationError::Zero {
            field: "failover.thresholds.max_consecutive_failures",
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }

    if config.admin.enabled {
        let key = config.admin.api_key.trim();
        if key.is_empty() {
            errors.push(ValidationError::MissingApiKey);
        } else if key == PLACEHOLDER_API_KEY {
            errors.push(ValidationError::PlaceholderApiKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_backend(backend: &BackendConfig, field: &'static str, errors: &mut Vec<ValidationError>) {
    if Url::parse(&backend.base_url).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: backend.base_url.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let mut config = GatewayConfig::default();
        config.search_engine.base_url = "not a url".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidUrl {
                field: "search_engine.base_url",
                value: "not a url".into()
            }]
        );
    }

    #[test]
    fn test_probe_timeout_must_fit_interval() {
        let mut config = GatewayConfig::default();
        config.failover.probe_interval_secs = 5;
        config.failover.probe_timeout_secs = 5;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::ProbeTimeoutTooLong { .. }));
    }

    #[test]
    fn test_admin_requires_key() {
        let mut config = GatewayConfig::default();
        config.admin.enabled = true;
        config.admin.api_key = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingApiKey]);
    }

    #[test]
    fn test_admin_rejects_placeholder_key() {
        let mut config = GatewayConfig::default();
        config.admin.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::PlaceholderApiKey]);

        config.admin.api_key = "s3cret-operator-key".into();
        assert!(validate_config(&config).is_ok());
    }
}

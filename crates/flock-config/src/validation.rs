// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for values Figment cannot check.

use crate::model::FlockConfig;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized config.
///
/// Figment handles type and unknown-key errors; this covers semantic
/// constraints such as value ranges.
pub fn validate_config(config: &FlockConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if !VALID_LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(format!(
            "service.log_level must be one of {:?}, got {:?}",
            VALID_LOG_LEVELS, config.service.log_level
        ));
    }

    if config.service.workers == 0 {
        errors.push("service.workers must be at least 1".to_string());
    }

    if config.service.queue_limit == 0 {
        errors.push("service.queue_limit must be at least 1".to_string());
    }

    if config.service.poll_interval_secs == 0 {
        errors.push("service.poll_interval_secs must be at least 1".to_string());
    }

    if !config.content.service_url.starts_with("http://")
        && !config.content.service_url.starts_with("https://")
    {
        errors.push(format!(
            "content.service_url must be an http(s) URL, got {:?}",
            config.content.service_url
        ));
    }

    if let Some(url) = &config.signal.service_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(format!(
                "signal.service_url must be an http(s) URL, got {url:?}"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&FlockConfig::default()).is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let mut config = FlockConfig::default();
        config.service.workers = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("workers")));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut config = FlockConfig::default();
        config.service.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("log_level")));
    }

    #[test]
    fn non_http_signal_url_is_rejected() {
        let mut config = FlockConfig::default();
        config.signal.service_url = Some("localhost:8080".to_string());
        assert!(validate_config(&config).is_err());
    }
}

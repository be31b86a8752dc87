//! Configuration validation with aggregated errors.
//! - Every problem is collected into one Vec<String> before failing
//! - Security-relevant values (credentials, audience, issuer) have no defaults
//! - One token_key maps to exactly one audience

use std::collections::HashMap;

use tracing::{error, info};

use crate::config::services::{DownstreamConfig, ServiceConfig};
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);

    if cfg.services.is_empty() {
        errors.push("config: 'services' is empty; at least one service required".to_string());
    }

    // token_key -> (service name, audience)
    let mut token_keys: HashMap<&str, (&str, &str)> = HashMap::new();

    let mut names: Vec<&String> = cfg.services.keys().collect();
    names.sort();
    for name in names {
        let service = &cfg.services[name];
        validate_service(name, service, &mut errors);

        let token_key = service.token_key(name);
        if token_key.trim().is_empty() {
            errors.push(format!("services['{}'].token_key must not be empty", name));
        }
        if let Some((prev, audience)) = token_keys.insert(token_key, (name.as_str(), service.audience.as_str())) {
            if audience != service.audience {
                errors.push(format!(
                    "services['{}'] and services['{}'] share token_key '{}' with different audiences",
                    prev, name, token_key
                ));
            }
        }
    }

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(offset) = settings.expiration_offset_ms {
        if offset > 60 * 60 * 1000 {
            errors.push(format!(
                "settings.expiration_offset_ms ({}) is unreasonably large",
                offset
            ));
        }
    }

    if settings.http_timeout_ms == Some(0) {
        errors.push("settings.http_timeout_ms must be > 0".to_string());
    }

    if settings.server.host.is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be a valid port",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

/// REQUIRED CREDENTIALS & CLAIMS
fn validate_service(name: &str, service: &DownstreamConfig, errors: &mut Vec<String>) {
    let required = [
        ("domain", &service.domain),
        ("client_id", &service.client_id),
        ("client_secret", &service.client_secret),
        ("audience", &service.audience),
        ("issuer", &service.issuer),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(format!("services['{}'].{} is required", name, field));
        }
    }

    if service.claims.type_claim.is_empty() || service.claims.properties_claim.is_empty() {
        errors.push(format!(
            "services['{}'].claims: type_claim and properties_claim must not be empty",
            name
        ));
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tokio::fs;
use tracing::{debug, error};

use crate::config::services::ServiceConfig;
use crate::config::settings::LoggingConfig;
use crate::config::validator;
use crate::errors::AuthError;
use crate::observability::metrics::get_metrics;

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config file {}", path.display()))?;

    parse_config(&expand_env_vars(&content)?).await
}

/// Parse YAML, apply defaults and fail on any validation error.
pub async fn parse_config(content: &str) -> Result<ServiceConfig> {
    let mut service_config: ServiceConfig = serde_yaml::from_str(content).inspect_err(|e| {
        error!("parse config error: {}", e);
    })?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging = Some(LoggingConfig::default());
    }

    debug!("validating config ...");
    if let Err(errors) = validator::validate_service_config(&service_config).await {
        return Err(AuthError::Config(format!(
            "config is not valid, total errors: {}\n{}",
            errors.len(),
            errors.join("\n")
        ))
        .into());
    }

    get_metrics().await.configured_services.set(service_config.services.len() as i64);
    Ok(service_config)
}

/// Replace `${VAR}` and `${VAR:default}` with environment values.
/// Unset variables without a default become empty and fail validation later.
pub fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]*))?\}")?;
    Ok(re
        .replace_all(input, |caps: &Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string())
}

use crate::config::types::{CollectorConfig, Config, OutputConfig, SourcesConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_collector_config(&config.collector)?;
    validate_output_config(&config.output)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates dispatcher and fetcher settings
fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    if config.max_concurrency < 1 || config.max_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and 100, got {}",
            config.max_concurrency
        )));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    for (field, name) in [
        ("database_name", &config.database_name),
        ("report_name", &config.report_name),
    ] {
        if name.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(ConfigError::Validation(format!(
                "{} must be a bare file name, got '{}'",
                field, name
            )));
        }
    }

    if config.database_name == config.report_name {
        return Err(ConfigError::Validation(
            "database_name and report_name must differ".to_string(),
        ));
    }

    Ok(())
}

/// Validates every fetchable source URL
///
/// Social entries are platform names rather than URLs and are not checked.
fn validate_sources(sources: &SourcesConfig) -> Result<(), ConfigError> {
    for (group, source) in sources.all_urls() {
        validate_source_url(group, source)?;
    }
    Ok(())
}

fn validate_source_url(group: &str, source: &str) -> Result<(), ConfigError> {
    let url = Url::parse(source).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid {} source '{}': {}", group, source, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} source '{}' must use http or https",
            group, source
        )));
    }

    Ok(())
}

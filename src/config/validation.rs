use crate::config::{Config, CrawlerSection, FilterSection, StorageSection};
use crate::filter::FilterRules;
use crate::url::ensure_default_scheme;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_section(&config.crawler)?;

    if let Some(filter) = &config.entry_filter {
        validate_filter_section(filter, "entry-filter")?;
    }
    if let Some(filter) = &config.yield_filter {
        validate_filter_section(filter, "yield-filter")?;
    }
    if let Some(storage) = &config.storage {
        validate_storage_section(storage)?;
    }

    Ok(())
}

/// Validates crawler behavior settings
fn validate_crawler_section(config: &CrawlerSection) -> Result<(), ConfigError> {
    if config.seed_url.is_empty() {
        return Err(ConfigError::Validation(
            "seed-url cannot be empty".to_string(),
        ));
    }

    if config.default_scheme != "http" && config.default_scheme != "https" {
        return Err(ConfigError::Validation(format!(
            "default-scheme must be \"http\" or \"https\", got \"{}\"",
            config.default_scheme
        )));
    }

    // The seed must be an absolute URL with a host once the scheme is ensured
    let seed = ensure_default_scheme(&config.seed_url, &config.default_scheme);
    let parsed = Url::parse(&seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed-url '{}': {}", seed, e)))?;
    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "seed-url '{}' has no host",
            seed
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a filter rule set by compiling its patterns
fn validate_filter_section(filter: &FilterSection, name: &str) -> Result<(), ConfigError> {
    if filter.patterns.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} must list at least one pattern",
            name
        )));
    }

    FilterRules::new(filter.mode, &filter.patterns)?;
    Ok(())
}

/// Validates state persistence settings
fn validate_storage_section(storage: &StorageSection) -> Result<(), ConfigError> {
    if storage.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

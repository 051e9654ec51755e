use crate::config::types::{Config, CrawlerConfig, OutputConfig, PolitenessConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_politeness_config(&config.politeness)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates traversal parameters
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_identifier(&config.seed_user)?;

    // max_depth >= 0 is always true for u32

    if config.reviewers_per_book < 1 {
        return Err(ConfigError::Validation(format!(
            "reviewers_per_book must be >= 1, got {}",
            config.reviewers_per_book
        )));
    }

    if config.max_interaction_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_interaction_pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates politeness delays and timeouts
fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.book_delay_min_ms > config.book_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "book_delay_min_ms ({}) must not exceed book_delay_max_ms ({})",
            config.book_delay_min_ms, config.book_delay_max_ms
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the site base URL
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.state_dir.is_empty() {
        return Err(ConfigError::Validation(
            "state_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Site identifiers are opaque but never empty and never contain whitespace
pub(crate) fn validate_identifier(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() {
        return Err(ConfigError::Validation(
            "seed_user cannot be empty".to_string(),
        ));
    }

    if id.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "seed_user must not contain whitespace, got '{}'",
            id
        )));
    }

    Ok(())
}

use crate::config::types::{Config, CrawlerConfig, ExtractConfig, OutputConfig, SearchConfig};
use crate::crawler::parse_date;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_crawler_config(&config.crawler)?;
    validate_extract_config(&config.extract)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the search section
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.query.trim().is_empty() {
        return Err(ConfigError::Validation("query cannot be empty".to_string()));
    }

    let start = parse_date(&config.start_date)?;
    let end = parse_date(&config.end_date)?;
    if start > end {
        return Err(ConfigError::Validation(format!(
            "start_date ({}) must not be after end_date ({})",
            start, end
        )));
    }

    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;
    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "endpoint must use http or https, got '{}'",
            endpoint.scheme()
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.num_workers < 1 || config.num_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "num_workers must be between 1 and 100, got {}",
            config.num_workers
        )));
    }

    if config.max_trials < 1 {
        return Err(ConfigError::Validation(format!(
            "max_trials must be >= 1, got {}",
            config.max_trials
        )));
    }

    if config.request_timeout < 1 || config.article_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got request_timeout={} article_timeout={}",
            config.request_timeout, config.article_timeout
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates extraction settings
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    if let Some(language) = &config.target_language {
        if language.trim().is_empty() {
            return Err(ConfigError::Validation(
                "target_language cannot be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

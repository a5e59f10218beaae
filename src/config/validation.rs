use crate::config::types::{Config, CrawlFile, ParserEntry, SiteConfig};
use crate::ConfigError;
use regex::Regex;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validates an entire crawl file
///
/// A missing domain or an empty seed list is not rejected here; the crawler
/// builder reports those with its own errors.
pub fn validate_crawl_file(file: &CrawlFile) -> Result<(), ConfigError> {
    validate(&file.crawler)?;
    validate_site(&file.site)?;
    validate_parsers(&file.parsers)?;
    Ok(())
}

/// Validates the engine settings
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.concurrent_requests < 1 || config.concurrent_requests > 256 {
        return Err(ConfigError::Validation(format!(
            "concurrent_requests must be between 1 and 256, got {}",
            config.concurrent_requests
        )));
    }

    if !config.request_timeout.is_finite() || config.request_timeout <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be a positive number of seconds, got {}",
            config.request_timeout
        )));
    }

    validate_seconds("delay", config.delay)?;
    validate_seconds("retry_wait_time", config.retry_wait_time)?;

    if !LOG_LEVELS.contains(&config.log_level.to_lowercase().as_str()) {
        return Err(ConfigError::Validation(format!(
            "log_level must be one of {}, got '{}'",
            LOG_LEVELS.join(", "),
            config.log_level
        )));
    }

    Ok(())
}

fn validate_seconds(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    if let Some(domain) = &site.domain {
        if !domain.trim().is_empty() {
            validate_domain_pattern(domain.trim())?;
        }
    }
    Ok(())
}

fn validate_parsers(parsers: &[ParserEntry]) -> Result<(), ConfigError> {
    for entry in parsers {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "parser name cannot be empty".to_string(),
            ));
        }

        if let Some(pattern) = &entry.pattern {
            Regex::new(pattern).map_err(|e| {
                ConfigError::InvalidPattern(format!(
                    "parser '{}' has an invalid pattern '{}': {}",
                    entry.name, pattern, e
                ))
            })?;
        }
    }
    Ok(())
}

/// Validates a domain pattern (supports a leading "*." wildcard)
pub fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}

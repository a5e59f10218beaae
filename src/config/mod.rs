//! Configuration module for Ripple
//!
//! This module holds the engine tunables, loads crawl files from TOML, and
//! offers an optional process-wide "current configuration" for simple callers.
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawler::config::load_config;
//! use std::path::Path;
//!
//! let file = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Max retries: {}", file.crawler.max_retries);
//! ```

mod parser;
mod types;
mod validation;

use crate::ConfigError;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

// Re-export types
pub use types::{Config, CrawlFile, OutputConfig, ParserEntry, SiteConfig};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_domain_pattern};

static CURRENT: Lazy<RwLock<Arc<Config>>> = Lazy::new(|| RwLock::new(Arc::new(Config::default())));

/// Returns the process-wide configuration
///
/// Crawlers built without an explicit configuration use this value, captured
/// at build time.
pub fn current() -> Arc<Config> {
    let guard = CURRENT.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(&guard)
}

/// Updates the process-wide configuration
///
/// The closure edits a copy; the copy replaces the current configuration only
/// if it validates. Crawlers that were already built keep the value they
/// captured.
///
/// ```
/// ripple_crawler::config::configure(|config| {
///     config.concurrent_requests = 8;
/// })
/// .unwrap();
/// ```
pub fn configure<F>(update: F) -> Result<Arc<Config>, ConfigError>
where
    F: FnOnce(&mut Config),
{
    let mut next = (*current()).clone();
    update(&mut next);
    validate(&next)?;

    let next = Arc::new(next);
    let mut guard = CURRENT.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Arc::clone(&next);
    Ok(next)
}

use crate::config::types::CrawlFile;
use crate::config::validation::validate_crawl_file;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a crawl file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML crawl file
///
/// # Returns
///
/// * `Ok(CrawlFile)` - Successfully loaded and validated crawl file
/// * `Err(ConfigError)` - Failed to load, parse, or validate the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use ripple_crawler::config::load_config;
///
/// let file = load_config(Path::new("crawl.toml")).unwrap();
/// println!("Concurrency: {}", file.crawler.concurrent_requests);
/// ```
pub fn load_config(path: &Path) -> Result<CrawlFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates crawl file content
pub fn parse_config(content: &str) -> Result<CrawlFile, ConfigError> {
    let file: CrawlFile = toml::from_str(content)?;
    validate_crawl_file(&file)?;
    Ok(file)
}

/// Computes a SHA-256 hash of the crawl file content
///
/// Logged at startup so runs can be matched to the exact file that drove them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a crawl file and returns both the parsed file and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(CrawlFile, String), ConfigError> {
    let file = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((file, hash))
}

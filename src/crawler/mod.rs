//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier of pending and visited URLs
//! - HTTP fetching with pacing, redirects and retries
//! - Parser selection and dispatch
//! - Request scheduling across a bounded worker pool
//! - Crawler definition and overall crawl coordination
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawler::crawler::{page_record, Crawler, ParserDefinition};
//! use ripple_crawler::output::CollectingSink;
//! use std::sync::Arc;
//!
//! # async fn run() -> ripple_crawler::Result<()> {
//! let crawler = Crawler::builder()
//!     .domain("example.com")
//!     .start_urls(["https://example.com/"])?
//!     .parse(ParserDefinition::new("page", page_record))
//!     .build()?;
//!
//! let sink = Arc::new(CollectingSink::new());
//! let stats = crawler.crawl(sink.clone()).await?;
//! println!("{} pages, {} records", stats.pages_crawled(), sink.len());
//! # Ok(())
//! # }
//! ```

mod coordinator;
mod definition;
mod dispatcher;
mod fetcher;
mod frontier;
mod html;
mod rate_gate;
mod request;
mod scheduler;

pub use definition::{Crawler, CrawlerBuilder, Handler, ParseOutput, ParserDefinition};
pub use dispatcher::{DispatchOutcome, Dispatcher, ParserRegistry};
pub use fetcher::{build_http_client, Fetcher, HttpTransport, Transport};
pub use frontier::{EnqueueOutcome, Frontier};
pub use html::{extract_links, page_record, parse_html, ParsedPage};
pub use rate_gate::RateGate;
pub use request::{CrawlRequest, CrawlResponse, Headers};
pub use scheduler::Scheduler;

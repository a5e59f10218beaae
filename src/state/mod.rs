//! State module for tracking crawl progress
//!
//! `PageState` tracks each URL from the moment the frontier accepts it until
//! its outcome is recorded.

mod page_state;

pub use page_state::PageState;

//! Parser selection and response dispatch

use crate::crawler::{CrawlResponse, ParserDefinition};
use crate::output::PipelineSink;
use crate::url::resolve_link;
use crate::{CrawlerError, ParseError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use url::Url;

/// Parser definitions in registration order, keyed by name
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry {
    definitions: Vec<ParserDefinition>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition; one with the same name is replaced in its original slot
    pub fn register(&mut self, definition: ParserDefinition) {
        match self
            .definitions
            .iter_mut()
            .find(|existing| existing.name() == definition.name())
        {
            Some(slot) => {
                tracing::debug!("Replacing parser '{}'", definition.name());
                *slot = definition;
            }
            None => self.definitions.push(definition),
        }
    }

    /// Highest-priority definition matching `url`; ties go to the earliest registered
    pub fn select(&self, url: &Url) -> Option<&ParserDefinition> {
        let mut best: Option<&ParserDefinition> = None;
        for definition in self.definitions.iter().filter(|d| d.matches(url)) {
            if best.map_or(true, |b| definition.priority() > b.priority()) {
                best = Some(definition);
            }
        }
        best
    }

    pub fn get(&self, name: &str) -> Option<&ParserDefinition> {
        self.definitions.iter().find(|d| d.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParserDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Result of dispatching one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Name of the parser that handled the response
    pub parser: String,

    /// Number of records forwarded to the sink
    pub records: usize,

    /// Resolved follow-up URLs; empty when the parser does not follow links
    pub follow: Vec<Url>,
}

/// Routes responses to parsers and their records to the sink
pub struct Dispatcher {
    registry: Arc<ParserRegistry>,
    sink: Arc<dyn PipelineSink>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ParserRegistry>, sink: Arc<dyn PipelineSink>) -> Self {
        Self { registry, sink }
    }

    /// Runs the selected parser on `response`
    ///
    /// Fails with `CrawlerError::NoParser` when nothing matches, and with a
    /// `ParseError` when the handler errors or panics.
    pub async fn dispatch(&self, response: &CrawlResponse) -> crate::Result<DispatchOutcome> {
        let definition =
            self.registry
                .select(&response.uri)
                .ok_or_else(|| CrawlerError::NoParser {
                    url: response.uri.to_string(),
                })?;

        let output = panic::catch_unwind(AssertUnwindSafe(|| definition.parse(response)))
            .map_err(|payload| ParseError::Panicked(panic_message(payload.as_ref())))??;

        let records = output.records.len();
        for record in output.records {
            self.sink.accept(record).await;
        }

        let follow = if definition.follows_links() {
            output
                .follow
                .iter()
                .filter_map(|href| {
                    let resolved = resolve_link(&response.uri, href);
                    if resolved.is_none() {
                        tracing::debug!("Dropping follow-up '{}' from {}", href, response.uri);
                    }
                    resolved
                })
                .collect()
        } else {
            Vec::new()
        };

        tracing::debug!(
            "Parser '{}' handled {}: {} records, {} follow-ups",
            definition.name(),
            response.uri,
            records,
            follow.len()
        );

        Ok(DispatchOutcome {
            parser: definition.name().to_string(),
            records,
            follow,
        })
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

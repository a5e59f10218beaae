//! Shared helpers for unit tests: log capture and fake transports

use crate::crawler::{CrawlResponse, Headers, Transport};
use crate::NetworkError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;
use url::Url;

/// In-memory sink for formatted log lines
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Number of captured lines containing `needle`
    pub(crate) fn count(&self, needle: &str) -> usize {
        self.contents().lines().filter(|l| l.contains(needle)).count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Captures logs emitted on the current thread until the guard is dropped
///
/// Works with the default current-thread `#[tokio::test]` runtime, where
/// spawned tasks run on the test thread.
pub(crate) fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

/// One scripted answer of a `ScriptedTransport`
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Page {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
    },
    Timeout,
    Refused,
}

impl Reply {
    pub(crate) fn html(body: &str) -> Self {
        Reply::Page {
            status: 200,
            headers: vec![("Content-Type".into(), "text/html; charset=utf-8".into())],
            body: body.to_string(),
        }
    }

    pub(crate) fn status(status: u16) -> Self {
        Reply::Page {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub(crate) fn redirect(status: u16, location: &str) -> Self {
        Reply::Page {
            status,
            headers: vec![("Location".into(), location.to_string())],
            body: String::new(),
        }
    }
}

/// Transport answering from a per-URL script
///
/// The n-th request to a URL gets the n-th reply; the last reply repeats.
/// Unknown URLs get an empty 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, Vec<Reply>>>,
    hits: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn replies(self, url: &str, replies: Vec<Reply>) -> Self {
        let key = Url::parse(url).unwrap().to_string();
        self.routes.lock().unwrap().insert(key, replies);
        self
    }

    pub(crate) fn page(self, url: &str, body: &str) -> Self {
        self.replies(url, vec![Reply::html(body)])
    }

    /// Number of requests made for `url`
    pub(crate) fn hits(&self, url: &str) -> usize {
        let key = Url::parse(url).unwrap().to_string();
        self.hits.lock().unwrap().iter().filter(|h| **h == key).count()
    }

    /// Every requested URL, in request order
    pub(crate) fn requests(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, url: &Url) -> Result<CrawlResponse, NetworkError> {
        let key = url.to_string();
        let attempt = {
            let mut hits = self.hits.lock().unwrap();
            let previous = hits.iter().filter(|h| **h == key).count();
            hits.push(key.clone());
            previous
        };

        let reply = self
            .routes
            .lock()
            .unwrap()
            .get(&key)
            .and_then(|replies| replies.get(attempt.min(replies.len().saturating_sub(1))).cloned())
            .unwrap_or_else(|| Reply::status(404));

        match reply {
            Reply::Page {
                status,
                headers,
                body,
            } => {
                let headers: Headers = headers.into_iter().collect();
                Ok(CrawlResponse::new(url.clone(), status, headers, body))
            }
            Reply::Timeout => Err(NetworkError::Timeout { url: key }),
            Reply::Refused => Err(NetworkError::Connect {
                url: key,
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// Transport that answers every URL with an empty page after a pause,
/// tracking how many requests overlap
pub(crate) struct SlowTransport {
    pause: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl SlowTransport {
    pub(crate) fn new(pause: Duration) -> Self {
        Self {
            pause,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for SlowTransport {
    async fn send(&self, url: &Url) -> Result<CrawlResponse, NetworkError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(self.pause).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(CrawlResponse::new(
            url.clone(),
            200,
            Headers::new(),
            String::new(),
        ))
    }
}

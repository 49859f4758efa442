//! Scripted in-memory transport with concurrency instrumentation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use antenati_core::{DownloadError, Item, ProgressSink, Transport, TransportResponse};
use async_trait::async_trait;

/// What the fake server does for one URL.
#[derive(Debug, Clone)]
pub enum Reply {
    Body {
        status: u16,
        content_type: Option<&'static str>,
        body: Vec<u8>,
    },
    /// Never answers.
    Hang,
    /// Panics inside `get`.
    Panic,
    /// Transport-level timeout before any response.
    TimedOut,
}

impl Reply {
    pub fn jpeg(len: usize) -> Self {
        Self::Body {
            status: 200,
            content_type: Some("image/jpeg"),
            body: vec![0xAB; len],
        }
    }

    pub fn status(status: u16) -> Self {
        Self::Body {
            status,
            content_type: Some("text/html"),
            body: b"<html>error</html>".to_vec(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeTransport {
    replies: HashMap<String, Reply>,
    fallback: Option<Reply>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every URL without a scripted reply gets `reply`.
    pub fn with_fallback(mut self, reply: Reply) -> Self {
        self.fallback = Some(reply);
        self
    }

    pub fn with_reply(mut self, url: impl Into<String>, reply: Reply) -> Self {
        self.replies.insert(url.into(), reply);
        self
    }

    /// Each call stays in flight for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous `get` calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = self
            .replies
            .get(url)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| Reply::status(404));

        match reply {
            Reply::Body {
                status,
                content_type,
                body,
            } => Ok(TransportResponse::from_bytes(status, content_type, body)),
            Reply::Hang => std::future::pending().await,
            Reply::Panic => panic!("transport exploded for {url}"),
            Reply::TimedOut => Err(DownloadError::timeout(url)),
        }
    }
}

/// Items `pag. 1..=n` with URLs `https://iiif.test/<i>`.
pub fn numbered_items(n: usize) -> Vec<Item> {
    (1..=n)
        .map(|i| Item::new(format!("c{i}"), format!("pag. {i}"), item_url(i)))
        .collect()
}

pub fn item_url(i: usize) -> String {
    format!("https://iiif.test/{i}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    SetTotal(usize),
    Update,
}

/// Progress sink recording every call in order.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn set_total(&self, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(ProgressEvent::SetTotal(total));
    }

    fn update(&self) {
        self.events.lock().unwrap().push(ProgressEvent::Update);
    }
}

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use couponwatch::app::dispatch::build_pipeline;
use couponwatch::channels::Channel;
use couponwatch::clock::{Clock, ManualClock};
use couponwatch::config::{Config, ReliabilityConfig};
use couponwatch::dedup::SeenStore;
use couponwatch::error::NotifierError;
use couponwatch::pipeline::Pipeline;

pub const RECIPIENT: &str = "+15550001111";

pub fn start_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-04-01T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// One listing entry in the shape the source site serves.
pub fn listing(id: &str, title: &str) -> String {
    format!(
        r#"<li data-id="{id}">
            <a href="/offer/{id}"><h3>{title}</h3></a>
            <p class="desc">100% off today</p>
            <span class="coupon-code">FREE-{id}</span>
        </li>"#
    )
}

pub fn page(entries: &[String]) -> String {
    format!("<html><body><ul>{}</ul></body></html>", entries.join("\n"))
}

pub fn empty_page() -> String {
    page(&[])
}

pub fn python_listings() -> Vec<String> {
    vec![
        listing("py-1", "Complete Python Bootcamp"),
        listing("py-2", "Python for Data Analysis"),
        listing("py-3", "Automate Things with Python"),
    ]
}

/// Serve `entries` as page 1; every other page is empty.
pub async fn mount_listing_page(server: &MockServer, entries: &[String]) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(entries)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_page()))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Channel double: records every message and can fail the first `n` sends.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<Sent>>,
    failures_left: Mutex<usize>,
    clock: Option<Arc<ManualClock>>,
}

#[derive(Debug, Clone)]
pub struct Sent {
    pub text: String,
    pub recipient: String,
    pub at: Option<DateTime<Utc>>,
}

impl RecordingChannel {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock: Some(clock),
            ..Self::default()
        }
    }

    pub fn fail_next(&self, n: usize) {
        *self.failures_left.lock().unwrap() = n;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, message: &str, recipient: &str) -> Result<(), NotifierError> {
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(NotifierError::Api {
                    channel: "recording".into(),
                    status: 503,
                    body: "service unavailable".into(),
                });
            }
        }
        self.sent.lock().unwrap().push(Sent {
            text: message.to_string(),
            recipient: recipient.to_string(),
            at: self.clock.as_ref().map(|c| c.now()),
        });
        Ok(())
    }
}

/// Everything one end-to-end scenario needs.
pub struct Harness {
    pub server: MockServer,
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub channel: Arc<RecordingChannel>,
    pub config: Config,
}

impl Harness {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(start_time()));
        let channel = Arc::new(RecordingChannel::new(clock.clone()));

        let mut config = Config::default();
        config.source.base_url = server.uri();
        config.source.max_pages = 3;
        config.source.detail_link_host = None;
        config.reliability = ReliabilityConfig {
            max_retries: 2,
            backoff_ms: 100,
            max_backoff_ms: 1_000,
        };
        config.store.path = dir.path().join("seen.json").display().to_string();

        Self {
            server,
            dir,
            clock,
            channel,
            config,
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("seen.json")
    }

    pub fn pipeline(&self) -> Pipeline {
        build_pipeline(
            &self.config,
            self.channel.clone(),
            RECIPIENT.to_string(),
            self.clock.clone(),
        )
        .unwrap()
    }

    /// Ids currently persisted on disk.
    pub fn persisted(&self) -> SeenStore {
        open_store(&self.store_path())
    }

    pub fn seed_store(&self, ids: &[&str]) {
        let mut store = open_store(&self.store_path());
        for id in ids {
            store.mark_seen(id, start_time()).unwrap();
        }
    }
}

pub fn open_store(path: &Path) -> SeenStore {
    SeenStore::open(path)
}

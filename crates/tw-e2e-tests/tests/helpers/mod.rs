//! Shared test harness for E2E integration tests.
//!
//! Wires a real `Tailer` to a temporary log directory, a `MockClock` and
//! `MockChannel`s, so tests drive rotation and alerting one tick at a time.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate, TimeZone};
use tempfile::TempDir;

use tw_log_tools::DailyLogNaming;
use tw_notify_channel::{MockChannel, NotificationChannel};
use tw_watcher::{Clock, DedupCache, Dispatcher, LevelRoutes, MockClock, Tailer, TickReport};

pub const PREFIX: &str = "laravel";

/// End-to-end harness around one tailer.
pub struct TestHarness {
    pub dir: TempDir,
    pub clock: Arc<MockClock>,
    pub telegram: Arc<MockChannel>,
    pub tailer: Tailer,
}

/// Builder for the harness: routing table, throttle window, extra channels.
pub struct HarnessBuilder {
    routes: BTreeMap<String, Vec<String>>,
    throttle_enabled: bool,
    window_secs: i64,
    channels: Vec<Arc<dyn NotificationChannel>>,
    telegram: Arc<MockChannel>,
}

impl HarnessBuilder {
    pub fn route(mut self, level: &str, channels: &[&str]) -> Self {
        self.routes.insert(
            level.to_string(),
            channels.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn throttle(mut self, enabled: bool, window_secs: i64) -> Self {
        self.throttle_enabled = enabled;
        self.window_secs = window_secs;
        self
    }

    pub fn channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn build(self) -> TestHarness {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(MockClock::new(
            Local.with_ymd_and_hms(2025, 12, 9, 16, 0, 0).unwrap(),
        ));

        let mut dispatcher = Dispatcher::new(LevelRoutes::new(self.routes));
        dispatcher.register(self.telegram.clone());
        for channel in self.channels {
            dispatcher.register(channel);
        }

        let throttle = DedupCache::new(self.throttle_enabled, self.window_secs, clock.clone());
        let naming = DailyLogNaming::new(dir.path(), PREFIX);
        let tailer = Tailer::new(naming, dispatcher, throttle, clock.clone());

        TestHarness {
            dir,
            clock,
            telegram: self.telegram,
            tailer,
        }
    }
}

impl TestHarness {
    /// Routes error/critical to "telegram", warning to nothing, 1-minute window.
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            routes: BTreeMap::new(),
            throttle_enabled: true,
            window_secs: 60,
            channels: Vec::new(),
            telegram: Arc::new(MockChannel::new("telegram")),
        }
        .route("error", &["telegram"])
        .route("critical", &["telegram"])
        .route("warning", &[])
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Path of the series file for `date`.
    pub fn log_path(&self, date: NaiveDate) -> PathBuf {
        self.tailer.naming().path_for(date)
    }

    /// Path of today's file according to the mock clock.
    pub fn today_path(&self) -> PathBuf {
        self.log_path(self.clock.today())
    }

    /// Append raw text to the file for `date`, creating it if needed.
    pub fn append(&self, date: NaiveDate, text: &str) {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(date))
            .unwrap();
        f.write_all(text.as_bytes()).unwrap();
        f.flush().unwrap();
    }

    /// Append to today's file.
    pub fn append_today(&self, text: &str) {
        self.append(self.clock.today(), text);
    }

    /// Create today's file (empty) and tick once so the tailer attaches to it.
    pub async fn attach_today(&mut self) -> TickReport {
        self.append_today("");
        self.tick().await
    }

    pub async fn tick(&mut self) -> TickReport {
        self.tailer.tick().await.unwrap()
    }
}

/// Format a log line in the watched grammar.
pub fn line(timestamp: &str, level: &str, message: &str) -> String {
    format!("[{timestamp}] production.{level}: {message}\n")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

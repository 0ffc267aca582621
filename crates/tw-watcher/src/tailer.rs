//! Rotation-aware tailer.
//!
//! Each tick resolves the file that should be watched (today's file, else
//! the most recently modified one of the series), switches to it when the
//! path changed, then reads the complete lines appended since the last
//! tick and runs them through parse → level filter → throttle → dispatch.
//!
//! States: Idle (`TailerState::current` is `None`), Watching (a handle is
//! open and positioned), Stopped (`watch` returned and the handle is closed).

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::watch;
use tw_log_tools::{DailyLogNaming, LogError};

use crate::clock::Clock;
use crate::config::WatcherConfig;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::{WatchError, WatchResult};
use crate::throttle::DedupCache;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on bytes pulled from the file in one read.
const MAX_READ_CHUNK_BYTES: u64 = 8 * 1024 * 1024;

// ── Tick report ───────────────────────────────────────────────

/// What one tick (or backlog scan) did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Complete lines consumed from the file.
    pub lines_read: usize,
    /// Lines that matched the entry grammar.
    pub parsed: usize,
    /// Entries dropped because their level is not routed.
    pub filtered: usize,
    /// Entries suppressed as duplicates.
    pub throttled: usize,
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl TickReport {
    pub fn merge(&mut self, other: TickReport) {
        self.lines_read += other.lines_read;
        self.parsed += other.parsed;
        self.filtered += other.filtered;
        self.throttled += other.throttled;
        self.delivered += other.delivered;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    fn record(&mut self, outcome: DispatchOutcome) {
        self.delivered += outcome.delivered;
        self.failed += outcome.failed;
        self.skipped += outcome.skipped;
    }
}

// ── State ─────────────────────────────────────────────────────

/// The file currently being tailed.
#[derive(Debug)]
struct OpenLog {
    path: PathBuf,
    file: File,
    /// End of the last complete line handed to the parser.
    offset: u64,
    identity: Option<FileIdentity>,
}

/// Device and inode of an opened file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    fn of(meta: &std::fs::Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    #[cfg(not(unix))]
    fn of(_meta: &std::fs::Metadata) -> Option<Self> {
        None
    }
}

/// Single-writer tailer state. `None` means Idle.
#[derive(Debug, Default)]
pub struct TailerState {
    current: Option<OpenLog>,
}

impl TailerState {
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|open| open.path.as_path())
    }

    pub fn offset(&self) -> Option<u64> {
        self.current.as_ref().map(|open| open.offset)
    }

    pub fn is_watching(&self) -> bool {
        self.current.is_some()
    }
}

/// Where a newly opened file is positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenAt {
    Start,
    End,
}

// ── Stop handle ───────────────────────────────────────────────

/// Requests the watch loop to stop at the next tick boundary.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

// ── Tailer ────────────────────────────────────────────────────

pub struct Tailer {
    naming: DailyLogNaming,
    dispatcher: Dispatcher,
    throttle: DedupCache,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    state: TailerState,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl Tailer {
    pub fn new(
        naming: DailyLogNaming,
        dispatcher: Dispatcher,
        throttle: DedupCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            naming,
            dispatcher,
            throttle,
            clock,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: TailerState::default(),
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        }
    }

    /// Wire a tailer from configuration: naming, routes, channels, throttle.
    pub fn from_config(config: &WatcherConfig, clock: Arc<dyn Clock>) -> WatchResult<Self> {
        let naming = DailyLogNaming::new(config.log_path.clone(), config.file_prefix.clone());
        let dispatcher = Dispatcher::from_config(config)?;
        let throttle = DedupCache::from_config(&config.throttle, clock.clone());
        Ok(Self::new(naming, dispatcher, throttle, clock).with_poll_interval(config.poll_interval()))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> &TailerState {
        &self.state
    }

    pub fn naming(&self) -> &DailyLogNaming {
        &self.naming
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn throttle_mut(&mut self) -> &mut DedupCache {
        &mut self.throttle
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Run one poll: resolve, switch if needed, consume new complete lines.
    pub async fn tick(&mut self) -> WatchResult<TickReport> {
        let target = self.naming.resolve_active(self.clock.today()).await?;

        // A deleted file keeps its open handle readable; drop it so a file
        // recreated under the same name gets picked up.
        let mut open_at = OpenAt::End;
        let held = self
            .state
            .current
            .as_ref()
            .filter(|open| open.path == target)
            .map(|open| open.identity);
        if let Some(identity) = held {
            match tokio::fs::metadata(&target).await {
                Err(_) => {
                    tracing::info!(path = %target.display(), "watched log file disappeared");
                    self.close();
                }
                Ok(meta) if identity.is_some() && identity != FileIdentity::of(&meta) => {
                    // Recreated between two polls: everything in it is new.
                    tracing::info!(path = %target.display(), "watched log file replaced");
                    self.close();
                    open_at = OpenAt::Start;
                }
                Ok(_) => {}
            }
        }

        if self.state.current_path() != Some(target.as_path()) {
            self.switch_to(target, open_at).await?;
        }
        Ok(self.drain().await)
    }

    /// One-time scan of the active file's existing content.
    ///
    /// Leaves the handle at the end of the last complete line, so the next
    /// `tick` carries on from there instead of skipping to EOF.
    pub async fn replay_backlog(&mut self) -> WatchResult<TickReport> {
        let target = self.naming.resolve_active(self.clock.today()).await?;
        self.switch_to(target, OpenAt::Start).await?;
        let report = self.drain().await;
        tracing::info!(
            lines = report.lines_read,
            delivered = report.delivered,
            "existing log entries processed"
        );
        Ok(report)
    }

    /// Single deterministic pass: optional backlog scan, one tick, close.
    pub async fn run_once(&mut self, process_existing: bool) -> WatchResult<TickReport> {
        let mut report = TickReport::default();
        if process_existing {
            report.merge(self.replay_backlog().await?);
        }
        let result = self.tick().await;
        self.close();
        report.merge(result?);
        Ok(report)
    }

    /// Poll until a stop is requested.
    ///
    /// The stop flag is checked between ticks only. Tick errors are logged
    /// and retried on the next poll, unless `stop_on_error` is set.
    pub async fn watch(&mut self, stop_on_error: bool) -> WatchResult<()> {
        let mut stop = self.stop_rx.clone();
        tracing::info!(
            dir = %self.naming.dir().display(),
            prefix = %self.naming.prefix(),
            poll_ms = self.poll_interval.as_millis() as u64,
            "watching log files"
        );

        let result = loop {
            if *stop.borrow_and_update() {
                break Ok(());
            }

            match self.tick().await {
                Ok(report) if report.lines_read > 0 => {
                    tracing::debug!(?report, "tick processed new lines");
                }
                Ok(_) => {}
                Err(e) if stop_on_error => break Err(e),
                Err(e) => tracing::error!(error = %e, "tick failed; retrying next poll"),
            }

            tokio::select! {
                () = tokio::time::sleep(self.poll_interval) => {}
                _ = stop.changed() => {}
            }
        };

        self.close();
        tracing::info!("watcher stopped");
        result
    }

    /// Release the open handle, if any.
    pub fn close(&mut self) {
        if let Some(open) = self.state.current.take() {
            tracing::debug!(path = %open.path.display(), offset = open.offset, "log file closed");
        }
    }

    // ── Internals ─────────────────────────────────────────────

    async fn switch_to(&mut self, path: PathBuf, at: OpenAt) -> WatchResult<()> {
        if let Some(previous) = self.state.current.take() {
            tracing::info!(
                from = %previous.path.display(),
                to = %path.display(),
                "switching log file"
            );
        }

        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "log file not present yet");
                return Ok(());
            }
            Err(e) => return Err(WatchError::Log(LogError::from_io(&path, e))),
        };

        let identity = file
            .metadata()
            .await
            .ok()
            .and_then(|meta| FileIdentity::of(&meta));

        let offset = match at {
            OpenAt::End => file
                .seek(SeekFrom::End(0))
                .await
                .map_err(|e| WatchError::Io(format!("{}: {e}", path.display())))?,
            OpenAt::Start => 0,
        };

        tracing::info!(path = %path.display(), offset, "watching log file");
        self.state.current = Some(OpenLog {
            path,
            file,
            offset,
            identity,
        });
        Ok(())
    }

    /// Consume every complete line currently available.
    ///
    /// A read failure drops the handle; the next tick reopens the file.
    async fn drain(&mut self) -> TickReport {
        let mut report = TickReport::default();
        loop {
            let lines = match self.read_chunk().await {
                Ok(Some(lines)) => lines,
                Ok(None) => break,
                Err(e) => {
                    let path = self.state.current.take().map(|open| open.path);
                    tracing::warn!(path = ?path, error = %e, "log read failed; going idle");
                    break;
                }
            };
            for line in &lines {
                self.process_line(line, &mut report).await;
            }
        }
        report
    }

    /// Read up to one chunk and split off its complete lines.
    ///
    /// Returns `None` when nothing complete is available; a trailing partial
    /// line stays unconsumed and is re-read from the same offset later.
    async fn read_chunk(&mut self) -> std::io::Result<Option<Vec<String>>> {
        let Some(open) = self.state.current.as_mut() else {
            return Ok(None);
        };

        let len = open.file.metadata().await?.len();
        if len < open.offset {
            tracing::warn!(
                path = %open.path.display(),
                previous_offset = open.offset,
                current_size = len,
                "log file truncated; reading from start"
            );
            open.offset = 0;
        }
        if len == open.offset {
            return Ok(None);
        }

        let want = (len - open.offset).min(MAX_READ_CHUNK_BYTES);
        open.file.seek(SeekFrom::Start(open.offset)).await?;
        let mut buf = Vec::with_capacity(want as usize);
        (&mut open.file).take(want).read_to_end(&mut buf).await?;

        let chunk_full = buf.len() as u64 == MAX_READ_CHUNK_BYTES;
        let Some(consumed) = consumable_len(&buf, chunk_full) else {
            return Ok(None);
        };
        open.offset += consumed as u64;

        let lines: Vec<String> = String::from_utf8_lossy(&buf[..consumed])
            .lines()
            .map(str::to_string)
            .collect();
        Ok(Some(lines))
    }

    async fn process_line(&mut self, line: &str, report: &mut TickReport) {
        report.lines_read += 1;

        let Some(entry) = tw_log_tools::parse(line) else {
            return;
        };
        report.parsed += 1;

        if !self.dispatcher.routes().contains_level(&entry.level) {
            report.filtered += 1;
            return;
        }

        if self.throttle.should_throttle(&entry) {
            report.throttled += 1;
            return;
        }

        let outcome = self.dispatcher.dispatch(&entry).await;
        report.record(outcome);
    }
}

/// How many leading bytes of `buf` can be handed to the parser.
///
/// Normally everything through the last newline. A full chunk without any
/// newline is one oversized line: it is split at the last complete UTF-8
/// character so no multi-byte sequence is cut in half.
fn consumable_len(buf: &[u8], chunk_full: bool) -> Option<usize> {
    if let Some(i) = buf.iter().rposition(|b| *b == b'\n') {
        return Some(i + 1);
    }
    if !chunk_full {
        return None;
    }
    match std::str::from_utf8(buf) {
        // Only the tail is an incomplete sequence.
        Err(e) if e.error_len().is_none() && e.valid_up_to() > 0 => Some(e.valid_up_to()),
        _ => Some(buf.len()),
    }
}

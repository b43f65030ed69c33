use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::dedup::DedupStore;
use crate::fetch::Fetch;
use crate::handler::Handler;
use crate::queue::HostQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Draining,
    Done,
}

/// Result of one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Stored { path: PathBuf, cleaned: bool },
    /// Already on disk when its turn came.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub url: String,
    pub host: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub host: String,
    /// Fetches started.
    pub fetched: usize,
    pub stored: usize,
    pub cleaned: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
    /// States the pipeline went through, in order.
    pub states: Vec<PipelineState>,
}

impl PipelineReport {
    /// The last state entered.
    pub fn state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Idle)
    }

    fn enter(&mut self, state: PipelineState) {
        self.states.push(state);
    }
}

/// Downloads the pages of one host, one per tick.
pub struct HostPipeline {
    queue: Arc<HostQueue>,
    delay: Duration,
    fetcher: Arc<dyn Fetch>,
    handler: Handler,
    dedup: DedupStore,
    cancel: CancellationToken,
    progress: Option<mpsc::UnboundedSender<Progress>>,
}

impl HostPipeline {
    pub fn new(
        queue: Arc<HostQueue>,
        delay: Duration,
        fetcher: Arc<dyn Fetch>,
        handler: Handler,
        dedup: DedupStore,
    ) -> Self {
        Self {
            queue,
            delay,
            fetcher,
            handler,
            dedup,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: mpsc::UnboundedSender<Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn queue(&self) -> &Arc<HostQueue> {
        &self.queue
    }

    /// Runs until the queue is drained or the run is cancelled. A cancelled pipeline goes from
    /// `Running` straight to `Done`.
    pub async fn run(self) -> PipelineReport {
        let host = self.queue.host().to_string();
        let mut report = PipelineReport {
            host: host.clone(),
            states: vec![PipelineState::Idle],
            ..Default::default()
        };

        if host.is_empty() {
            log::warn!("Pipeline without host, nothing to do");
            report.enter(PipelineState::Done);
            return report;
        }
        if self.queue.is_empty().await {
            log::warn!("{host}: queue is empty, nothing to do");
            report.enter(PipelineState::Done);
            return report;
        }

        report.enter(PipelineState::Running);
        log::info!(
            "{host}: {} pages to download, one every {:?}",
            self.queue.len().await,
            self.delay
        );

        let mut ticker = time::interval_at(Instant::now() + self.delay, self.delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while report.state() == PipelineState::Running {
            if self.queue.is_empty().await {
                report.enter(PipelineState::Draining);
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    log::info!("{host}: cancelled");
                    report.cancelled = true;
                    break;
                }
                _ = ticker.tick() => {}
            }

            match self.queue.pop_front().await {
                Some(url) => self.step(&host, url, &mut report).await,
                None => report.enter(PipelineState::Draining),
            }
        }

        report.enter(PipelineState::Done);
        log::info!(
            "{host}: done, {} stored ({} cleaned), {} skipped, {} failed",
            report.stored,
            report.cleaned,
            report.skipped,
            report.failed
        );
        report
    }

    async fn step(&self, host: &str, url: String, report: &mut PipelineReport) {
        let outcome = self.process(&url, report).await;
        match &outcome {
            Outcome::Stored { cleaned, .. } => {
                report.stored += 1;
                if *cleaned {
                    report.cleaned += 1;
                }
            }
            Outcome::Skipped => report.skipped += 1,
            Outcome::Failed(_) => report.failed += 1,
        }

        if let Some(progress) = &self.progress {
            progress
                .send(Progress {
                    url,
                    host: host.to_string(),
                    outcome,
                })
                .ok();
        }
    }

    async fn process(&self, url: &str, report: &mut PipelineReport) -> Outcome {
        let target = match self.dedup.mapper().map(url) {
            Ok(target) => target,
            Err(e) => {
                log::warn!("{e}");
                return Outcome::Failed(e.to_string());
            }
        };
        if !self.dedup.should_download(url) {
            log::info!("{url} | {} | already downloaded", target.path().display());
            return Outcome::Skipped;
        }

        report.fetched += 1;
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("{url} | {} | {e}", target.path().display());
                return Outcome::Failed(e.to_string());
            }
        };

        match self.handler.handle(page, &target).await {
            Ok(handled) => {
                let how = if handled.cleaned { "Clean" } else { "Default" };
                log::info!("{url} | {} | OK, {how}", handled.path.display());
                Outcome::Stored {
                    path: handled.path,
                    cleaned: handled.cleaned,
                }
            }
            Err(e) => {
                log::error!("{url} | {e}");
                Outcome::Failed(e.to_string())
            }
        }
    }
}

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use futures::future;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{CrawlerConfig, Targets};
use crate::dedup::DedupStore;
use crate::fetch::{Fetch, Fetcher};
use crate::handler::Registry;
use crate::path::{host_of, PathMapper};
use crate::pipeline::{HostPipeline, PipelineReport, Progress};
use crate::queue::HostQueue;
use crate::sitemap::SitemapResolver;

/// Pages to download, grouped by host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub hosts: BTreeMap<String, Vec<String>>,
    /// Pages listed by sitemaps and direct targets.
    pub found: usize,
    pub already_downloaded: usize,
    pub invalid: usize,
}

impl Plan {
    pub fn total(&self) -> usize {
        self.hosts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Adds `url` to the queue of its host. URLs without a host are counted as invalid.
    pub fn push(&mut self, url: String) {
        match host_of(&url) {
            Some(host) => self.hosts.entry(host).or_default().push(url),
            None => {
                log::warn!("Skipping invalid URL {url}");
                self.invalid += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub hosts: Vec<PipelineReport>,
    pub skipped_hosts: Vec<String>,
}

impl CrawlReport {
    pub fn stored(&self) -> usize {
        self.hosts.iter().map(|r| r.stored).sum()
    }

    pub fn failed(&self) -> usize {
        self.hosts.iter().map(|r| r.failed).sum()
    }

    pub fn cancelled(&self) -> bool {
        self.hosts.iter().any(|r| r.cancelled)
    }
}

/// Everything a crawl needs, built once from a [`CrawlerConfig`].
pub struct Crawler {
    delay: Duration,
    concurrent: bool,
    fetcher: Arc<dyn Fetch>,
    dedup: DedupStore,
    registry: Registry,
}

impl Crawler {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(&config.user_agent, config.fetch_timeout_duration()?)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    pub fn with_fetcher(config: &CrawlerConfig, fetcher: Arc<dyn Fetch>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            delay: config.delay_duration()?,
            concurrent: config.concurrent,
            fetcher,
            dedup: DedupStore::new(PathMapper::new(&config.base_dir)),
            registry: Registry::from_sites(&config.sites, config.unmatched_host),
        })
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Resolves sitemaps and direct pages into per-host queues, minus what is on disk.
    pub async fn plan(&self, targets: &Targets) -> Plan {
        let mut plan = Plan::default();

        if !targets.sitemaps.is_empty() {
            let resolved = SitemapResolver::new(self.fetcher.as_ref(), &self.dedup)
                .resolve(&targets.sitemaps)
                .await;
            log::info!(
                "Sitemaps: {} pages found, {} already downloaded, {} sitemaps skipped",
                resolved.found,
                resolved.already_downloaded,
                resolved.skipped_sitemaps
            );
            plan.found += resolved.found;
            plan.already_downloaded += resolved.already_downloaded;
            for url in resolved.pages {
                plan.push(url);
            }
        }

        let queued = plan.hosts.values().flatten().cloned().collect::<HashSet<_>>();
        for url in &targets.pages {
            if queued.contains(url) {
                continue;
            }
            plan.found += 1;
            if self.dedup.should_download(url) {
                plan.push(url.clone());
            } else {
                plan.already_downloaded += 1;
            }
        }

        log::info!(
            "Found: {}, already downloaded: {}, in queue: {} over {} hosts",
            plan.found,
            plan.already_downloaded,
            plan.total(),
            plan.hosts.len()
        );
        plan
    }

    /// Number of pages of `plan` that will be fetched, leaving out hosts the registry skips.
    pub fn queued(&self, plan: &Plan) -> usize {
        plan.hosts
            .iter()
            .filter(|(host, _)| self.registry.accepts(host))
            .map(|(_, urls)| urls.len())
            .sum()
    }

    /// Runs one pipeline per host of `plan`, in parallel when configured so.
    pub async fn execute(
        &self,
        plan: Plan,
        cancel: CancellationToken,
        progress: Option<mpsc::UnboundedSender<Progress>>,
    ) -> Result<CrawlReport> {
        if plan.is_empty() {
            bail!("Nothing to download");
        }

        let mut report = CrawlReport::default();
        let mut pipelines = Vec::new();
        for (host, urls) in plan.hosts {
            let handler = match self.registry.lookup(&host) {
                Some(handler) => handler,
                None => {
                    report.skipped_hosts.push(host);
                    continue;
                }
            };
            let mut pipeline = HostPipeline::new(
                Arc::new(HostQueue::new(host, urls)),
                self.delay,
                self.fetcher.clone(),
                handler,
                self.dedup.clone(),
            )
            .with_cancel(cancel.clone());
            if let Some(progress) = &progress {
                pipeline = pipeline.with_progress(progress.clone());
            }
            pipelines.push(pipeline);
        }

        if self.concurrent {
            let handles = pipelines
                .into_iter()
                .map(|pipeline| tokio::spawn(pipeline.run()))
                .collect::<Vec<_>>();
            for joined in future::join_all(handles).await {
                report.hosts.push(joined?);
            }
        } else {
            for pipeline in pipelines {
                if cancel.is_cancelled() {
                    break;
                }
                report.hosts.push(pipeline.run().await);
            }
        }

        Ok(report)
    }

    /// [`plan`](Self::plan) then [`execute`](Self::execute).
    pub async fn run(
        &self,
        targets: &Targets,
        cancel: CancellationToken,
        progress: Option<mpsc::UnboundedSender<Progress>>,
    ) -> Result<CrawlReport> {
        if targets.is_empty() {
            bail!("Nothing to download");
        }
        let plan = self.plan(targets).await;
        self.execute(plan, cancel, progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnmatchedHost;

    #[test]
    fn plan_groups_by_host() {
        let mut plan = Plan::default();
        for url in [
            "https://ria.ru/a",
            "https://www.mk.ru/b",
            "https://ria.ru/c",
            "http://localhost:8080/d",
            "nonsense",
        ] {
            plan.push(url.to_string());
        }

        assert_eq!(4, plan.total());
        assert_eq!(1, plan.invalid);
        assert_eq!(
            vec!["https://ria.ru/a".to_string(), "https://ria.ru/c".to_string()],
            plan.hosts["ria.ru"]
        );
        assert!(plan.hosts.contains_key("localhost:8080"));
    }

    #[test]
    fn queued_leaves_out_skipped_hosts() {
        let config = CrawlerConfig {
            unmatched_host: UnmatchedHost::Skip,
            ..Default::default()
        };
        let crawler = Crawler::new(&config).unwrap();

        let mut plan = Plan::default();
        for url in [
            "https://ria.ru/a",
            "https://ria.ru/b",
            "https://www.mk.ru/c",
            "https://example.com/d",
            "https://example.com/e",
        ] {
            plan.push(url.to_string());
        }

        assert_eq!(5, plan.total());
        assert_eq!(3, crawler.queued(&plan));
    }

    #[tokio::test]
    async fn nothing_to_download() {
        let base = tempfile::tempdir().unwrap();
        let config = CrawlerConfig {
            base_dir: base.path().to_path_buf(),
            ..Default::default()
        };
        let crawler = Crawler::new(&config).unwrap();

        let err = crawler
            .run(&Targets::default(), CancellationToken::new(), None)
            .await
            .unwrap_err();
        assert_eq!("Nothing to download", err.to_string());
    }
}

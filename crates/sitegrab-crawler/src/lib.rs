mod config;
mod crawl;
mod dedup;
mod fetch;
mod handler;
mod path;
mod pipeline;
mod queue;
mod sitemap;
mod store;

pub use config::{ConfigError, CrawlerConfig, SiteRule, Targets, UnmatchedHost};
pub use crawl::{CrawlReport, Crawler, Plan};
pub use dedup::DedupStore;
pub use fetch::{Fetch, FetchError, Fetcher};
pub use handler::{Handled, Handler, Registry};
pub use path::{host_key, host_of, MappedPath, PathError, PathMapper, INDEX_FILE};
pub use pipeline::{HostPipeline, Outcome, PipelineReport, PipelineState, Progress};
pub use queue::HostQueue;
pub use sitemap::{parse_sitemap, Resolved, Sitemap, SitemapError, SitemapKind, SitemapResolver};
pub use store::StoreError;

pub use anyhow;
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use sitegrab_crawler::{
    host_of, CancellationToken, CrawlReport, Crawler, CrawlerConfig, Handler, Outcome, Progress,
    Targets, UnmatchedHost,
};
use sitegrab_html::{clean, ContentClass, Itemprop, Locate};
use tokio::runtime;
use tokio::sync::mpsc;

/// Per-host paced page downloader
#[derive(Debug, Parser)]
#[clap(name = "sitegrab", version)]
pub struct Args {
    #[clap(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[clap(name = "crawl")]
    Crawl(CrawlArgs),
    #[clap(name = "clean")]
    Clean(CleanArgs),
    #[clap(hide = true)]
    Completion,
}

/// Download every page listed by sitemaps and targets, one host pipeline per host
#[derive(Debug, clap::Args)]
pub struct CrawlArgs {
    /// Yaml (or json) file listing `sitemaps` and `pages` to download
    #[clap(parse(from_os_str), long, short, default_value = "urls.yaml")]
    pub targets: PathBuf,
    /// Optional crawler yaml configuration file
    #[clap(env = "SITEGRAB_CONFIG", parse(from_os_str), long)]
    pub config: Option<PathBuf>,
    /// Override the directory pages are stored in
    #[clap(parse(from_os_str), long)]
    pub base_dir: Option<PathBuf>,
    /// Override the delay in seconds between two requests to the same host
    #[clap(long)]
    pub delay: Option<f32>,
    /// Override the per request timeout in seconds
    #[clap(long)]
    pub fetch_timeout: Option<u64>,
    /// Override crawler's user agent
    #[clap(long)]
    pub user_agent: Option<String>,
    /// Override what happens to hosts without site rule
    #[clap(arg_enum, long)]
    pub unmatched_host: Option<UnmatchedHost>,
    /// Crawl hosts one after the other on a single thread
    #[clap(long)]
    pub sequential: bool,
    /// No SIGINT handling, the run can only be killed
    #[clap(long)]
    pub no_sigint: bool,
    /// Do not display the progress bar
    #[clap(long)]
    pub no_progress: bool,
    /// When quiet no logs are outputted
    #[clap(long, short)]
    pub quiet: bool,
    /// Log every page and sitemap
    #[clap(long, short, parse(from_occurrences))]
    pub verbose: u8,
}

impl TryFrom<&CrawlArgs> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CrawlArgs) -> Result<Self, Self::Error> {
        let mut conf = load_config(args.config.as_deref())?;
        if let Some(base_dir) = &args.base_dir {
            conf.base_dir = base_dir.clone();
        }
        if let Some(delay) = args.delay {
            conf.delay = delay;
        }
        if let Some(fetch_timeout) = args.fetch_timeout {
            conf.fetch_timeout = fetch_timeout;
        }
        if let Some(user_agent) = &args.user_agent {
            conf.user_agent = user_agent.to_string();
        }
        if let Some(unmatched_host) = args.unmatched_host {
            conf.unmatched_host = unmatched_host;
        }
        if args.sequential {
            conf.concurrent = false;
        }
        if args.no_sigint {
            conf.handle_sigint = false;
        }
        conf.validate()?;
        Ok(conf)
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CrawlerConfig> {
    match path {
        Some(path) => Ok(serde_yaml::from_reader(File::open(path)?)?),
        None => Ok(CrawlerConfig::default()),
    }
}

fn load_targets(path: &Path) -> anyhow::Result<Targets> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Cannot open targets {}: {e}", path.display()))?;
    Ok(serde_yaml::from_reader(file)?)
}

pub fn crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let config = CrawlerConfig::try_from(&args)?;
    let targets = load_targets(&args.targets)?;
    if targets.is_empty() {
        println!("Nothing to download");
        return Ok(());
    }

    let rt = if config.concurrent {
        runtime::Builder::new_multi_thread().enable_all().build()?
    } else {
        runtime::Builder::new_current_thread().enable_all().build()?
    };
    let show_progress = !args.no_progress;
    let report = rt.block_on(async move {
        let crawler = Crawler::new(&config)?;
        let plan = crawler.plan(&targets).await;
        if plan.is_empty() {
            return Ok(None);
        }

        let cancel = CancellationToken::new();
        if config.handle_sigint {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupted, stopping after the current pages");
                    cancel.cancel();
                }
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let bar = progress_bar(show_progress, crawler.queued(&plan));
        let progress = tokio::spawn(track_progress(rx, bar.clone()));

        let report = crawler.execute(plan, cancel, Some(tx)).await?;
        progress.await?;
        bar.finish_and_clear();
        Ok::<_, anyhow::Error>(Some(report))
    })?;

    match report {
        Some(report) => print_summary(&report),
        None => println!("Nothing to download"),
    }
    Ok(())
}

fn progress_bar(visible: bool, total: usize) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(500));
    bar
}

async fn track_progress(mut rx: mpsc::UnboundedReceiver<Progress>, bar: ProgressBar) {
    while let Some(progress) = rx.recv().await {
        let status = match progress.outcome {
            Outcome::Stored { cleaned: true, .. } => "clean",
            Outcome::Stored { cleaned: false, .. } => "raw",
            Outcome::Skipped => "skipped",
            Outcome::Failed(_) => "failed",
        };
        bar.set_message(format!("{} {status}", progress.host));
        bar.inc(1);
    }
}

fn print_summary(report: &CrawlReport) {
    for host in &report.hosts {
        println!(
            "{}: {} stored ({} cleaned), {} skipped, {} failed",
            host.host, host.stored, host.cleaned, host.skipped, host.failed
        );
    }
    for host in &report.skipped_hosts {
        println!("{host}: skipped, no site rule");
    }
    println!(
        "Total: {} stored, {} failed{}",
        report.stored(),
        report.failed(),
        if report.cancelled() { " (interrupted)" } else { "" }
    );
}

#[derive(Debug, Clone, Copy, clap::ArgEnum)]
pub enum RuleArg {
    Itemprop,
    ContentClass,
}

/// Clean a single page and print the result to stdout
#[derive(Debug, clap::Args)]
#[clap(group = clap::ArgGroup::new("page").required(true))]
pub struct CleanArgs {
    /// A local html page to clean
    #[clap(group = "page", parse(from_os_str), long)]
    pub file: Option<PathBuf>,
    /// A distant html page to clean
    #[clap(group = "page", long)]
    pub url: Option<String>,
    /// Rule used to find the article, defaults to the rule of the URL's host
    #[clap(arg_enum, long)]
    pub rule: Option<RuleArg>,
    /// Crawler yaml configuration file holding site rules
    #[clap(env = "SITEGRAB_CONFIG", parse(from_os_str), long)]
    pub config: Option<PathBuf>,
    /// Custom user agent to download the page
    #[clap(long, conflicts_with = "file")]
    pub ua: Option<String>,
}

fn rule_for(args: &CleanArgs) -> anyhow::Result<Option<Arc<dyn Locate>>> {
    if let Some(rule) = args.rule {
        let rule: Arc<dyn Locate> = match rule {
            RuleArg::Itemprop => Arc::new(Itemprop::default()),
            RuleArg::ContentClass => Arc::new(ContentClass::default()),
        };
        return Ok(Some(rule));
    }

    let config = load_config(args.config.as_deref())?;
    let handler = args
        .url
        .as_deref()
        .and_then(host_of)
        .and_then(|host| config.sites.get(&host).map(Handler::from));
    Ok(match handler {
        Some(Handler::Clean(rule)) => Some(rule),
        Some(Handler::Raw) | None => None,
    })
}

pub fn clean_page(args: CleanArgs) -> anyhow::Result<()> {
    let page = if let Some(url) = &args.url {
        let mut builder = reqwest::blocking::ClientBuilder::new();
        if let Some(ua) = &args.ua {
            builder = builder.user_agent(ua);
        }
        let client = builder.build()?;
        client.get(url).send()?.error_for_status()?.bytes()?.to_vec()
    } else if let Some(path) = &args.file {
        fs::read(path)?
    } else {
        anyhow::bail!("Missing `url` or `file`");
    };

    let output = match rule_for(&args)? {
        Some(rule) => match clean(&page, rule.as_ref()) {
            Ok(cleaned) => cleaned.bytes,
            Err(e) => {
                log::warn!("{e}, printing the raw page");
                page
            }
        },
        None => {
            log::warn!("No rule for this page, printing the raw page");
            page
        }
    };

    let mut stdout = io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.flush()?;
    Ok(())
}

/// Default log filter of `crawl`. `sitegrab` is the target of this binary.
fn crawl_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "sitegrab=info,sitegrab_crawler=info",
        _ => "sitegrab=debug,sitegrab_crawler=debug,sitegrab_html=debug",
    }
}

fn init_logger(filter: &str) {
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Crawl(args) => {
            if !args.quiet {
                init_logger(crawl_log_filter(args.verbose));
            }
            crawl(args)
        }
        SubCommand::Clean(args) => {
            init_logger("sitegrab_html=warn,sitegrab=warn");
            clean_page(args)
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "sitegrab", &mut io::stdout());
            Ok(())
        }
    }
}

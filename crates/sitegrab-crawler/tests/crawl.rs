use std::fs;
use std::path::Path;
use std::sync::Arc;

use sitegrab_crawler::{
    CancellationToken, CrawlerConfig, Crawler, DedupStore, Fetcher, Outcome, PathMapper, SiteRule,
    SitemapResolver, Targets, UnmatchedHost,
};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn host(server: &MockServer) -> String {
    server.address().to_string()
}

fn config(base: &Path) -> CrawlerConfig {
    CrawlerConfig {
        delay: 0.01,
        fetch_timeout: 5,
        base_dir: base.to_path_buf(),
        ..Default::default()
    }
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn urlset(server: &MockServer, routes: &[&str]) -> String {
    let urls = routes
        .iter()
        .map(|r| format!("<url><loc>{}{r}</loc></url>", server.uri()))
        .collect::<String>();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{urls}</urlset>"#
    )
}

#[tokio::test]
async fn sitemap_skips_pages_on_disk() {
    let server = MockServer::start().await;
    let base = tempfile::tempdir().unwrap();

    mount_page(&server, "/sitemap.xml", &urlset(&server, &["/a", "/b"])).await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("new a"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>raw b</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let host_dir = base.path().join(host(&server));
    fs::create_dir_all(&host_dir).unwrap();
    fs::write(host_dir.join("a"), "old a").unwrap();

    let crawler = Crawler::new(&config(base.path())).unwrap();
    let targets = Targets {
        sitemaps: vec![format!("{}/sitemap.xml", server.uri())],
        pages: Vec::new(),
    };

    let plan = crawler.plan(&targets).await;
    assert_eq!(2, plan.found);
    assert_eq!(1, plan.already_downloaded);
    assert_eq!(
        vec![format!("{}/b", server.uri())],
        plan.hosts[&host(&server)]
    );

    let report = crawler
        .execute(plan, CancellationToken::new(), None)
        .await
        .unwrap();
    assert_eq!(1, report.stored());
    assert_eq!("<p>raw b</p>", fs::read_to_string(host_dir.join("b")).unwrap());
    assert_eq!("old a", fs::read_to_string(host_dir.join("a")).unwrap());
}

#[tokio::test]
async fn site_handler_extracts_article() {
    let server = MockServer::start().await;
    let base = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/news/1.html",
        r#"<!DOCTYPE html><html><head><meta name="keywords" content="x">
        <title>Portal</title><style>body{}</style></head><body>
        <script>ads()</script>
        <h1 itemprop="name">Flood in the city</h1>
        <div itemprop="articleBody"><p>Water rose overnight.</p><span>share</span></div>
        </body></html>"#,
    )
    .await;

    let mut config = config(base.path());
    config.sites.insert(host(&server), SiteRule::itemprop());
    let crawler = Crawler::new(&config).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let report = crawler
        .run(
            &Targets {
                sitemaps: Vec::new(),
                pages: vec![format!("{}/news/1.html", server.uri())],
            },
            CancellationToken::new(),
            Some(tx),
        )
        .await
        .unwrap();
    assert_eq!(1, report.stored());

    let progress = rx.recv().await.unwrap();
    assert!(matches!(progress.outcome, Outcome::Stored { cleaned: true, .. }));

    let stored =
        fs::read_to_string(base.path().join(host(&server)).join("news/1.html")).unwrap();
    assert_eq!(
        r#"<html><head><meta charset="utf-8"><title>Flood in the city</title></head><body><p>Water rose overnight.</p></body></html>"#,
        stored
    );
}

#[tokio::test]
async fn unmatched_host_can_be_skipped() {
    let server = MockServer::start().await;
    let base = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        unmatched_host: UnmatchedHost::Skip,
        ..config(base.path())
    };
    let crawler = Crawler::new(&config).unwrap();

    let report = crawler
        .run(
            &Targets {
                sitemaps: Vec::new(),
                pages: vec![format!("{}/page", server.uri())],
            },
            CancellationToken::new(),
            None,
        )
        .await
        .unwrap();
    assert_eq!(vec![host(&server)], report.skipped_hosts);
    assert!(report.hosts.is_empty());
}

#[tokio::test]
async fn failing_urls_are_reported_and_skipped() {
    let server = MockServer::start().await;
    let base = tempfile::tempdir().unwrap();
    mount_page(&server, "/ok", "fine").await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let crawler = Crawler::new(&config(base.path())).unwrap();
    let report = crawler
        .run(
            &Targets {
                sitemaps: Vec::new(),
                pages: vec![
                    format!("{}/broken", server.uri()),
                    format!("{}/ok", server.uri()),
                ],
            },
            CancellationToken::new(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(1, report.failed());
    assert_eq!(1, report.stored());
    assert!(base.path().join(host(&server)).join("ok").is_file());
    assert!(!base.path().join(host(&server)).join("broken").exists());
}

#[tokio::test]
async fn sitemap_index_and_gzip() {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    let server = MockServer::start().await;
    let base = tempfile::tempdir().unwrap();

    let index = format!(
        "<sitemapindex><sitemap><loc>{0}/s1.xml.gz</loc></sitemap><sitemap><loc>{0}/broken.xml</loc></sitemap></sitemapindex>",
        server.uri()
    );
    mount_page(&server, "/index.xml", &index).await;

    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(urlset(&server, &["/x", "/y", "/x"]).as_bytes())
        .unwrap();
    Mock::given(method("GET"))
        .and(path("/s1.xml.gz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gz.finish().unwrap())
                .insert_header("content-type", "application/x-gzip"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/broken.xml", "<urlset><url>").await;

    let fetcher = Fetcher::new("sitegrab-test", std::time::Duration::from_secs(5)).unwrap();
    let dedup = DedupStore::new(PathMapper::new(base.path()));
    let resolved = SitemapResolver::new(&fetcher, &dedup)
        .resolve(&[format!("{}/index.xml", server.uri())])
        .await;

    assert_eq!(
        vec![format!("{}/x", server.uri()), format!("{}/y", server.uri())],
        resolved.pages
    );
    assert_eq!(2, resolved.found);
    assert_eq!(1, resolved.skipped_sitemaps);
}

#[tokio::test]
async fn sequential_mode_runs_every_host() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    let base = tempfile::tempdir().unwrap();
    mount_page(&first, "/one", "1").await;
    mount_page(&second, "/two", "2").await;

    let config = CrawlerConfig {
        concurrent: false,
        ..config(base.path())
    };
    let crawler = Crawler::with_fetcher(
        &config,
        Arc::new(Fetcher::new("sitegrab-test", std::time::Duration::from_secs(5)).unwrap()),
    )
    .unwrap();

    let report = crawler
        .run(
            &Targets {
                sitemaps: Vec::new(),
                pages: vec![format!("{}/one", first.uri()), format!("{}/two", second.uri())],
            },
            CancellationToken::new(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(2, report.hosts.len());
    assert_eq!(2, report.stored());
}

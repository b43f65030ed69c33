use std::collections::{HashSet, VecDeque};
use std::io::{self, Read};

use flate2::read::GzDecoder;
use sxd_document::parser;
use thiserror::Error;

use crate::dedup::DedupStore;
use crate::fetch::{Fetch, FetchError};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("cannot decompress {url}: {source}")]
    Decompress {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse sitemap {url}: {reason}")]
    Xml { url: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// `<sitemapindex>`, each `loc` is another sitemap.
    Index,
    /// `<urlset>`, each `loc` is a page.
    Urlset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sitemap {
    pub kind: SitemapKind,
    pub locs: Vec<String>,
}

/// Extracts the trimmed `loc` values of a sitemap, whatever their namespace.
pub fn parse_sitemap(xml: &str) -> Result<Sitemap, String> {
    let package = parser::parse(xml).map_err(|e| e.to_string())?;
    let document = package.as_document();

    let kind = document
        .root()
        .children()
        .into_iter()
        .find_map(|child| child.element())
        .map(|root| match root.name().local_part() {
            "sitemapindex" => SitemapKind::Index,
            _ => SitemapKind::Urlset,
        })
        .unwrap_or(SitemapKind::Urlset);

    let factory = sxd_xpath::Factory::new();
    let xpath = factory
        .build("//*[local-name()='loc']")
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "missing XPath".to_string())?;
    let context = sxd_xpath::Context::new();
    let value = xpath
        .evaluate(&context, document.root())
        .map_err(|e| e.to_string())?;

    let locs = match value {
        sxd_xpath::Value::Nodeset(nodes) => nodes
            .document_order()
            .into_iter()
            .map(|node| node.string_value().trim().to_string())
            .filter(|loc| !loc.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    Ok(Sitemap { kind, locs })
}

fn decode(url: &str, body: Vec<u8>) -> Result<String, SitemapError> {
    if body.starts_with(&GZIP_MAGIC) {
        let mut gz = GzDecoder::new(&body[..]);
        let mut xml = String::new();
        gz.read_to_string(&mut xml)
            .map_err(|source| SitemapError::Decompress {
                url: url.to_string(),
                source,
            })?;
        Ok(xml)
    } else {
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Pages found in a set of sitemaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Pages left to download, in sitemap order, without duplicates.
    pub pages: Vec<String>,
    /// Every page listed, downloaded or not.
    pub found: usize,
    pub already_downloaded: usize,
    /// Sitemaps skipped because of a fetch or parse error.
    pub skipped_sitemaps: usize,
}

/// Turns sitemap URLs into the list of pages still to download.
pub struct SitemapResolver<'a> {
    fetcher: &'a dyn Fetch,
    dedup: &'a DedupStore,
}

impl<'a> SitemapResolver<'a> {
    pub fn new(fetcher: &'a dyn Fetch, dedup: &'a DedupStore) -> Self {
        Self { fetcher, dedup }
    }

    /// Fetches and parses a single sitemap, gzipped or not.
    pub async fn fetch_sitemap(&self, url: &str) -> Result<Sitemap, SitemapError> {
        let body = self.fetcher.fetch(url).await?;
        let xml = decode(url, body)?;
        parse_sitemap(&xml).map_err(|reason| SitemapError::Xml {
            url: url.to_string(),
            reason,
        })
    }

    /// Follows sitemap indexes and collects the pages that are not on disk yet.
    ///
    /// A sitemap that cannot be fetched or parsed is logged and skipped.
    pub async fn resolve(&self, sitemaps: &[String]) -> Resolved {
        let mut resolved = Resolved::default();
        let mut visited = HashSet::new();
        let mut seen = HashSet::new();
        let mut worklist = sitemaps.iter().cloned().collect::<VecDeque<_>>();

        while let Some(sitemap_url) = worklist.pop_front() {
            if !visited.insert(sitemap_url.clone()) {
                continue;
            }

            let sitemap = match self.fetch_sitemap(&sitemap_url).await {
                Ok(sitemap) => sitemap,
                Err(e) => {
                    log::warn!("Skipping sitemap: {e}");
                    resolved.skipped_sitemaps += 1;
                    continue;
                }
            };
            log::debug!(
                "Sitemap {sitemap_url} ({:?}) lists {} locations",
                sitemap.kind,
                sitemap.locs.len()
            );

            match sitemap.kind {
                SitemapKind::Index => worklist.extend(sitemap.locs),
                SitemapKind::Urlset => {
                    for page_url in sitemap.locs {
                        if !seen.insert(page_url.clone()) {
                            continue;
                        }
                        resolved.found += 1;
                        if self.dedup.should_download(&page_url) {
                            resolved.pages.push(page_url);
                        } else {
                            resolved.already_downloaded += 1;
                        }
                    }
                }
            }
        }

        resolved
    }
}

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use sitegrab_html::{clean, ContentClass, Itemprop, Locate};

use crate::config::{SiteRule, UnmatchedHost};
use crate::path::MappedPath;
use crate::store::{self, StoreError};

/// Turns a fetched page into a stored file.
#[derive(Clone)]
pub enum Handler {
    /// Store the page as fetched.
    Raw,
    /// Store the cleaned article, or the page as fetched if cleaning fails.
    Clean(Arc<dyn Locate>),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "Raw"),
            Self::Clean(_) => write!(f, "Clean"),
        }
    }
}

impl From<&SiteRule> for Handler {
    fn from(rule: &SiteRule) -> Self {
        match rule {
            SiteRule::Raw => Self::Raw,
            SiteRule::Itemprop { body, title } => Self::Clean(Arc::new(Itemprop {
                body: body.clone(),
                title: title.clone(),
            })),
            SiteRule::ContentClass { class, heading } => Self::Clean(Arc::new(ContentClass {
                class: class.clone(),
                heading: heading.clone(),
            })),
        }
    }
}

/// A stored page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled {
    pub path: PathBuf,
    pub cleaned: bool,
}

impl Handler {
    pub async fn handle(&self, page: Vec<u8>, target: &MappedPath) -> Result<Handled, StoreError> {
        let (bytes, cleaned) = match self {
            Self::Raw => (page, false),
            Self::Clean(rule) => clean_or_raw(rule.clone(), page).await,
        };

        let path = store::write(target, &bytes).await?;
        Ok(Handled { path, cleaned })
    }
}

async fn clean_or_raw(rule: Arc<dyn Locate>, page: Vec<u8>) -> (Vec<u8>, bool) {
    let page = Arc::new(page);
    let input = page.clone();
    let cleaned = tokio::task::spawn_blocking(move || clean(&input, rule.as_ref())).await;

    match cleaned {
        Ok(Ok(cleaned)) => (cleaned.bytes, true),
        Ok(Err(e)) => {
            log::warn!("Cleaning failed, keeping raw page: {e}");
            (Arc::unwrap_or_clone(page), false)
        }
        Err(e) => {
            log::error!("Cleaning task failed, keeping raw page: {e}");
            (Arc::unwrap_or_clone(page), false)
        }
    }
}

/// Site handlers by exact host (with port when explicit).
#[derive(Debug, Clone)]
pub struct Registry {
    handlers: HashMap<String, Handler>,
    unmatched: UnmatchedHost,
}

impl Registry {
    pub fn new(unmatched: UnmatchedHost) -> Self {
        Self {
            handlers: HashMap::new(),
            unmatched,
        }
    }

    pub fn from_sites<'a>(
        sites: impl IntoIterator<Item = (&'a String, &'a SiteRule)>,
        unmatched: UnmatchedHost,
    ) -> Self {
        let mut registry = Self::new(unmatched);
        for (host, rule) in sites {
            registry.register(host.clone(), Handler::from(rule));
        }
        registry
    }

    pub fn register(&mut self, host: impl Into<String>, handler: Handler) {
        self.handlers.insert(host.into(), handler);
    }

    /// Whether [`lookup`](Self::lookup) would return a handler for `host`.
    pub fn accepts(&self, host: &str) -> bool {
        self.handlers.contains_key(host) || self.unmatched == UnmatchedHost::Default
    }

    /// Returns the handler of `host`, `None` when the host must be skipped.
    pub fn lookup(&self, host: &str) -> Option<Handler> {
        match (self.handlers.get(host), self.unmatched) {
            (Some(handler), _) => {
                log::debug!("Host {host} handled by {handler:?}");
                Some(handler.clone())
            }
            (None, UnmatchedHost::Default) => {
                log::info!("Host {host} has no site rule, pages are stored raw");
                Some(Handler::Raw)
            }
            (None, UnmatchedHost::Skip) => {
                log::warn!("Host {host} has no site rule, skipping it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_policy() {
        let mut registry = Registry::new(UnmatchedHost::Skip);
        registry.register("ria.ru", Handler::from(&SiteRule::itemprop()));

        assert!(matches!(registry.lookup("ria.ru"), Some(Handler::Clean(_))));
        assert!(registry.lookup("www.ria.ru").is_none());
        assert!(registry.accepts("ria.ru"));
        assert!(!registry.accepts("www.ria.ru"));

        let registry = Registry::new(UnmatchedHost::Default);
        assert!(matches!(registry.lookup("example.com"), Some(Handler::Raw)));
        assert!(registry.accepts("example.com"));
    }

    #[tokio::test]
    async fn clean_handler_stores_article() {
        let base = tempfile::tempdir().unwrap();
        let target = MappedPath {
            dir: base.path().join("ria.ru"),
            filename: "1.html".into(),
        };
        let page = br#"<html><body><script>x</script>
            <h1 itemprop="name">Title</h1><div itemprop="articleBody">Text</div>
            </body></html>"#;

        let handled = Handler::from(&SiteRule::itemprop())
            .handle(page.to_vec(), &target)
            .await
            .unwrap();
        assert!(handled.cleaned);

        let stored = std::fs::read_to_string(handled.path).unwrap();
        assert!(stored.contains("<title>Title</title>"));
        assert!(stored.contains("<body>Text</body>"));
        assert!(!stored.contains("script"));
    }

    #[tokio::test]
    async fn raw_handler_keeps_bytes() {
        let base = tempfile::tempdir().unwrap();
        let target = MappedPath {
            dir: base.path().join("example.com"),
            filename: "b".into(),
        };
        let page = b"\x00\x01 not html".to_vec();

        let handled = Handler::Raw.handle(page.clone(), &target).await.unwrap();
        assert!(!handled.cleaned);
        assert_eq!(page, std::fs::read(handled.path).unwrap());
    }
}

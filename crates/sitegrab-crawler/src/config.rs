use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("delay must be a positive number of seconds, got {0}")]
    InvalidDelay(f32),

    #[error("fetch timeout must be at least one second")]
    InvalidTimeout,

    #[error("site rule for {host:?}: {reason}")]
    InvalidSite { host: String, reason: &'static str },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Seconds between two requests to the same host.
    #[serde(default = "default_delay")]
    pub delay: f32,

    /// Seconds before a single fetch is abandoned.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Run host pipelines in parallel, otherwise one host after the other.
    #[serde(default = "default_concurrent")]
    pub concurrent: bool,

    #[serde(default = "default_unmatched_host")]
    pub unmatched_host: UnmatchedHost,

    #[serde(default = "default_handle_sigint")]
    pub handle_sigint: bool,

    #[serde(default = "default_sites")]
    pub sites: HashMap<String, SiteRule>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            delay: default_delay(),
            fetch_timeout: default_fetch_timeout(),
            base_dir: default_base_dir(),
            concurrent: default_concurrent(),
            unmatched_host: default_unmatched_host(),
            handle_sigint: default_handle_sigint(),
            sites: default_sites(),
        }
    }
}

impl CrawlerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delay_duration()?;
        self.fetch_timeout_duration()?;
        for (host, rule) in &self.sites {
            rule.validate()
                .map_err(|reason| ConfigError::InvalidSite {
                    host: host.clone(),
                    reason,
                })?;
        }
        Ok(())
    }

    pub fn delay_duration(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f32(self.delay)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or(ConfigError::InvalidDelay(self.delay))
    }

    pub fn fetch_timeout_duration(&self) -> Result<Duration, ConfigError> {
        match self.fetch_timeout {
            0 => Err(ConfigError::InvalidTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }
}

fn default_user_agent() -> String {
    String::from("sitegrab")
}

fn default_delay() -> f32 {
    15.
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_concurrent() -> bool {
    true
}

fn default_unmatched_host() -> UnmatchedHost {
    UnmatchedHost::Default
}

fn default_handle_sigint() -> bool {
    true
}

fn default_sites() -> HashMap<String, SiteRule> {
    HashMap::from([
        ("ria.ru".to_string(), SiteRule::itemprop()),
        ("www.mk.ru".to_string(), SiteRule::content_class()),
    ])
}

/// What to do with pages of a host that has no site rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ArgEnum))]
pub enum UnmatchedHost {
    /// Store the raw page.
    Default,
    /// Drop the host with a warning.
    Skip,
}

/// How pages of a given host are turned into stored content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteRule {
    /// Store the raw page.
    Raw,

    /// Body and title are marked with `itemprop` attributes.
    Itemprop {
        #[serde(default = "default_itemprop_body")]
        body: String,
        #[serde(default = "default_itemprop_title")]
        title: String,
    },

    /// Body is the first element with the given class, title its first `heading` element.
    ContentClass {
        #[serde(default = "default_content_class")]
        class: String,
        #[serde(default = "default_content_heading")]
        heading: String,
    },
}

impl SiteRule {
    pub fn itemprop() -> Self {
        Self::Itemprop {
            body: default_itemprop_body(),
            title: default_itemprop_title(),
        }
    }

    pub fn content_class() -> Self {
        Self::ContentClass {
            class: default_content_class(),
            heading: default_content_heading(),
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        match self {
            Self::Raw => Ok(()),
            Self::Itemprop { body, title } if body.is_empty() || title.is_empty() => {
                Err("itemprop values cannot be empty")
            }
            Self::Itemprop { .. } => Ok(()),
            Self::ContentClass { class, heading } if class.is_empty() || heading.is_empty() => {
                Err("class and heading cannot be empty")
            }
            Self::ContentClass { .. } => Ok(()),
        }
    }
}

fn default_itemprop_body() -> String {
    String::from("articleBody")
}

fn default_itemprop_title() -> String {
    String::from("name")
}

fn default_content_class() -> String {
    String::from("content")
}

fn default_content_heading() -> String {
    String::from("h1")
}

/// Where to start crawling from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Targets {
    /// Sitemap (or sitemap index) URLs.
    #[serde(default)]
    pub sitemaps: Vec<String>,

    /// Page URLs downloaded as they are.
    #[serde(default)]
    pub pages: Vec<String>,
}

impl Targets {
    pub fn is_empty(&self) -> bool {
        self.sitemaps.is_empty() && self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CrawlerConfig::default();
        config.validate().unwrap();
        assert_eq!(Duration::from_secs(15), config.delay_duration().unwrap());
        assert_eq!(Some(&SiteRule::itemprop()), config.sites.get("ria.ru"));
        assert_eq!(Some(&SiteRule::content_class()), config.sites.get("www.mk.ru"));
    }

    #[test]
    fn non_positive_delay_is_rejected() {
        for delay in [0., -1., f32::NAN] {
            let config = CrawlerConfig {
                delay,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidDelay(_))
            ));
        }
    }

    #[test]
    fn fractional_delay() {
        let config = CrawlerConfig {
            delay: 0.5,
            ..Default::default()
        };
        assert_eq!(Duration::from_millis(500), config.delay_duration().unwrap());
    }

    #[test]
    fn empty_site_rule_is_rejected() {
        let mut config = CrawlerConfig::default();
        config.sites.insert(
            "example.com".into(),
            SiteRule::Itemprop {
                body: String::new(),
                title: "name".into(),
            },
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSite { .. })
        ));
    }
}

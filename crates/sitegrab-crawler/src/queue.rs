use std::collections::VecDeque;

use tokio::sync::Mutex;

/// Pending URLs of one host.
///
/// The lock is only held to push or pop, never while a page is fetched or handled.
#[derive(Debug)]
pub struct HostQueue {
    host: String,
    pending: Mutex<VecDeque<String>>,
}

impl HostQueue {
    pub fn new(host: impl Into<String>, urls: impl IntoIterator<Item = String>) -> Self {
        Self {
            host: host.into(),
            pending: Mutex::new(urls.into_iter().collect()),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn push(&self, url: String) {
        self.pending.lock().await.push_back(url);
    }

    pub async fn extend(&self, urls: impl IntoIterator<Item = String>) {
        self.pending.lock().await.extend(urls);
    }

    pub async fn pop_front(&self) -> Option<String> {
        self.pending.lock().await.pop_front()
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}

//! Crawl frontier: the FIFO of pending URLs, the seen set and the visited store
use crate::url::{normalize, DomainPolicy};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// URLs whose fetch completed, in completion order
///
/// Cloning shares the store, so callers can take snapshots while a crawl is
/// writing to it.
#[derive(Debug, Clone, Default)]
pub struct VisitedLinks {
    inner: Arc<Mutex<VisitedInner>>,
}

#[derive(Debug, Default)]
struct VisitedInner {
    order: Vec<String>,
    set: HashSet<String>,
}

impl VisitedLinks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VisitedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a completed URL; repeated calls keep the first position
    ///
    /// Returns true if the URL was not already recorded.
    pub fn mark_visited(&self, url: &str) -> bool {
        let mut inner = self.lock();
        if !inner.set.insert(url.to_string()) {
            return false;
        }
        inner.order.push(url.to_string());
        true
    }

    /// Point-in-time copy of the visited URLs
    pub fn snapshot_links(&self) -> Vec<String> {
        self.lock().order.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes every visited URL out of the store
    pub fn drain(&self) -> Vec<String> {
        let mut inner = self.lock();
        inner.set.clear();
        std::mem::take(&mut inner.order)
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.set.clear();
        inner.order.clear();
    }
}

/// Pending work for one crawl
///
/// Owned by the scheduler. Every queued URL is also in `seen`, so nothing is
/// ever queued twice.
#[derive(Debug)]
pub struct Frontier {
    policy: DomainPolicy,
    queued: VecDeque<Url>,
    seen: HashSet<String>,
}

impl Frontier {
    pub fn new(policy: DomainPolicy) -> Self {
        Self {
            policy,
            queued: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Queues a URL if it is new and in scope
    ///
    /// # Returns
    ///
    /// * `true` - The URL was queued
    /// * `false` - The URL was already seen, out of scope or not crawlable
    pub fn enqueue(&mut self, url: Url) -> bool {
        let Ok(url) = normalize(url) else {
            return false;
        };

        if self.seen.contains(url.as_str()) {
            return false;
        }

        if !self.policy.allows(&url) {
            tracing::trace!("Skipping out of scope URL {}", url);
            return false;
        }

        self.seen.insert(url.to_string());
        tracing::trace!("Queued {}", url);
        self.queued.push_back(url);
        true
    }

    /// Queues the seed URL, bypassing the domain policy
    pub fn enqueue_seed(&mut self, url: Url) -> bool {
        match normalize(url) {
            Ok(url) if self.seen.insert(url.to_string()) => {
                self.queued.push_back(url);
                true
            }
            _ => false,
        }
    }

    /// Records a URL as seen without queuing it
    ///
    /// Returns true if the URL was new.
    pub fn mark_seen(&mut self, url: Url) -> bool {
        normalize(url).map_or(false, |url| self.seen.insert(url.to_string()))
    }

    /// Lets links on the host of `url` through as if it were the seed host
    pub fn alias_seed_host(&mut self, url: &Url) -> bool {
        self.policy.add_alias(url)
    }

    /// Removes the oldest queued URL
    pub fn dequeue(&mut self) -> Option<Url> {
        self.queued.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Number of distinct URLs ever queued or marked seen
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }
}

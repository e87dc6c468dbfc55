//! Crawl lifecycle states and the shared control handle
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tokio::sync::Notify;

/// Represents where a crawl is in its lifecycle
///
/// ```text
/// Idle -> Running -> Draining -> Finished
///            ^          |
///            +----------+
/// Running | Draining -> Stopped -> Finished
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CrawlStatus {
    /// No crawl has started
    Idle = 0,

    /// Dispatching URLs from the frontier
    Running = 1,

    /// The frontier is empty but fetches are still in flight
    Draining = 2,

    /// Stop was requested; in-flight fetches are finishing
    Stopped = 3,

    /// The crawl is over
    Finished = 4,
}

impl CrawlStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Draining,
            3 => Self::Stopped,
            4 => Self::Finished,
            _ => Self::Idle,
        }
    }

    /// Returns true while a crawl is in progress
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Draining | Self::Stopped)
    }

    /// Returns true if moving from `self` to `next` is a valid transition
    pub fn can_transition_to(&self, next: CrawlStatus) -> bool {
        use CrawlStatus::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Draining)
                | (Draining, Running)
                | (Running, Stopped)
                | (Draining, Stopped)
                | (Running, Finished)
                | (Draining, Finished)
                | (Stopped, Finished)
        )
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
            Self::Finished => "finished",
        };
        write!(f, "{}", s)
    }
}

/// Status and cancellation flag shared by one crawl and its callers
///
/// A fresh control is created for every crawl so a stop aimed at a finished
/// crawl never leaks into the next one.
#[derive(Debug)]
pub struct CrawlControl {
    status: AtomicU8,
    cancelled: AtomicBool,
    notify: Notify,
}

impl CrawlControl {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(CrawlStatus::Idle as u8),
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    pub fn status(&self) -> CrawlStatus {
        CrawlStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Moves to `next` if the transition is valid
    ///
    /// # Returns
    ///
    /// * `true` - The status is now `next`
    /// * `false` - The transition was rejected and the status is unchanged
    pub fn advance(&self, next: CrawlStatus) -> bool {
        self.status
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let current = CrawlStatus::from_u8(current);
                (current == next || current.can_transition_to(next)).then_some(next as u8)
            })
            .is_ok()
    }

    /// Requests cooperative cancellation
    ///
    /// Returns true if this call signalled an active crawl.
    pub fn cancel(&self) -> bool {
        let was_cancelled = self.cancelled.swap(true, Ordering::AcqRel);
        self.notify.notify_waiters();
        if !self.advance(CrawlStatus::Stopped) {
            return false;
        }
        !was_cancelled
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not missed
        notified.as_mut().enable();

        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl Default for CrawlControl {
    fn default() -> Self {
        Self::new()
    }
}

use crate::robots::CachedRobots;
use std::time::{Duration, Instant};

/// Tracks the state of one host during a crawl
///
/// Owned by the scheduler; used for politeness delays and robots.txt caching.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// When the last request to this host was dispatched
    pub last_request: Option<Instant>,

    /// Cached robots.txt rules for this host
    pub robots: Option<CachedRobots>,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was dispatched to this host
    pub fn record_request(&mut self, now: Instant) {
        self.last_request = Some(now);
    }

    /// Calculates how long to wait before the next request
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < delay).then(|| delay - elapsed)
    }

    /// Returns true if robots.txt must be (re)fetched
    pub fn needs_robots(&self) -> bool {
        self.robots.as_ref().map_or(true, CachedRobots::is_stale)
    }

    /// The delay to apply between requests to this host
    ///
    /// The larger of the configured delay and the robots.txt `Crawl-delay`.
    pub fn effective_delay(&self, configured: Duration, agent: &str) -> Duration {
        self.robots
            .as_ref()
            .and_then(|robots| robots.crawl_delay(agent))
            .map_or(configured, |crawl_delay| crawl_delay.max(configured))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::ParsedRobots;

    #[test]
    fn test_new_host_state() {
        let state = HostState::new();
        assert!(state.last_request.is_none());
        assert!(state.needs_robots());
    }

    #[test]
    fn test_record_request() {
        let mut state = HostState::new();
        let now = Instant::now();

        state.record_request(now);
        let later = now + Duration::from_millis(10);
        state.record_request(later);

        assert_eq!(state.last_request, Some(later));
    }

    #[test]
    fn test_time_until_next_request() {
        let mut state = HostState::new();
        let delay = Duration::from_millis(1000);
        let now = Instant::now();

        assert!(state.time_until_next_request(delay, now).is_none());

        state.last_request = Some(now);
        assert_eq!(
            state.time_until_next_request(delay, now),
            Some(Duration::from_millis(1000))
        );
        assert_eq!(
            state.time_until_next_request(delay, now + Duration::from_millis(400)),
            Some(Duration::from_millis(600))
        );
        assert!(state
            .time_until_next_request(delay, now + Duration::from_millis(1100))
            .is_none());
    }

    #[test]
    fn test_zero_delay_never_waits() {
        let mut state = HostState::new();
        let now = Instant::now();
        state.record_request(now);
        assert!(state.time_until_next_request(Duration::ZERO, now).is_none());
    }

    #[test]
    fn test_effective_delay() {
        let mut state = HostState::new();
        let configured = Duration::from_millis(500);
        assert_eq!(state.effective_delay(configured, "BotBot"), configured);

        state.robots = Some(CachedRobots::new(ParsedRobots::from_content(
            "User-agent: *\nCrawl-delay: 2",
        )));
        assert_eq!(
            state.effective_delay(configured, "BotBot"),
            Duration::from_secs(2)
        );
        assert_eq!(
            state.effective_delay(Duration::from_secs(5), "BotBot"),
            Duration::from_secs(5)
        );
        assert!(!state.needs_robots());
    }
}

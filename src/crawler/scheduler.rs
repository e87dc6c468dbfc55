//! Crawl scheduler: the single control loop of a crawl
//!
//! This module handles:
//! - Dispatching frontier URLs to a bounded set of workers
//! - robots.txt checks and budget reservation before each dispatch
//! - Per-host politeness delays, including robots.txt crawl delays
//! - Feeding worker results back into the frontier
//! - Cooperative cancellation and the crawl state machine
//!
//! The scheduler is the only writer of the frontier, budget counters and host
//! state, so none of them need locking.

use crate::config::CrawlConfig;
use crate::crawler::budget::BudgetController;
use crate::crawler::frontier::{Frontier, VisitedLinks};
use crate::crawler::sink::panic_message;
use crate::crawler::worker::{process_page, PageContext, PageOutcome};
use crate::output::{CrawlIssue, CrawlSummary, PageError};
use crate::robots::{agent_token, fetch_robots, CachedRobots};
use crate::state::{CrawlControl, CrawlStatus, HostState};
use crate::url::{normalize_url, DomainPolicy};
use crate::ConfigError;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{Id, JoinError, JoinSet};
use url::Url;

/// Marks the crawl finished however the scheduler goes away
///
/// A `run` future dropped mid-crawl (a timeout, a lost `select!` branch)
/// would otherwise leave the status active forever.
struct FinishOnDrop(Arc<CrawlControl>);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        if self.0.status().is_active() {
            tracing::debug!("Crawl dropped before completion, marking finished");
            self.0.advance(CrawlStatus::Finished);
        }
    }
}

/// Drives one crawl from seed to completion
pub struct Scheduler {
    config: Arc<CrawlConfig>,
    ctx: Arc<PageContext>,
    seed: Url,
    agent: String,
    frontier: Frontier,
    budget: BudgetController,
    hosts: HashMap<String, HostState>,
    visited: VisitedLinks,
    control: Arc<CrawlControl>,
    in_flight: HashMap<Id, Url>,
    pages_visited: usize,
    pages_failed: usize,
    budget_rejected: usize,
    robots_rejected: usize,
    issues: Vec<CrawlIssue>,
    _finish: FinishOnDrop,
}

impl Scheduler {
    /// Creates a scheduler with the seed URL queued
    ///
    /// # Arguments
    ///
    /// * `ctx` - Collaborators shared with the workers
    /// * `visited` - Store that receives every completed URL
    /// * `control` - Status and cancellation flag for this crawl
    ///
    /// # Returns
    ///
    /// * `Ok(Scheduler)` - Ready to run
    /// * `Err(ConfigError)` - The seed URL or a blacklist pattern is invalid
    pub fn new(
        ctx: PageContext,
        visited: VisitedLinks,
        control: Arc<CrawlControl>,
    ) -> Result<Self, ConfigError> {
        let config = Arc::clone(&ctx.config);

        let seed = normalize_url(&config.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.url, e)))?;

        let policy = DomainPolicy::from_config(&config, &seed)?;
        let mut frontier = Frontier::new(policy);
        frontier.enqueue_seed(seed.clone());

        Ok(Self {
            budget: BudgetController::new(&config.budget),
            agent: agent_token(config.user_agent.as_deref()).to_string(),
            config,
            ctx: Arc::new(ctx),
            seed,
            frontier,
            hosts: HashMap::new(),
            visited,
            _finish: FinishOnDrop(Arc::clone(&control)),
            control,
            in_flight: HashMap::new(),
            pages_visited: 0,
            pages_failed: 0,
            budget_rejected: 0,
            robots_rejected: 0,
            issues: Vec::new(),
        })
    }

    /// Runs the crawl until the frontier is exhausted or a stop is requested
    ///
    /// Always ends in [`CrawlStatus::Finished`].
    pub async fn run(mut self) -> CrawlSummary {
        let started_at = Utc::now();
        let start = Instant::now();
        let max_concurrency = self.config.max_concurrency.max(1);

        self.control.advance(CrawlStatus::Running);
        tracing::info!(
            "Starting crawl of {} (max concurrency {})",
            self.seed,
            max_concurrency
        );

        let mut tasks: JoinSet<PageOutcome> = JoinSet::new();

        loop {
            while tasks.len() < max_concurrency
                && !self.control.is_cancelled()
                && !self.budget.is_exhausted()
            {
                let Some(url) = self.frontier.dequeue() else {
                    break;
                };

                if !self.admit(&url).await {
                    continue;
                }

                self.wait_for_host(&url).await;

                if self.control.is_cancelled() {
                    break;
                }

                let is_seed = url == self.seed;
                let page = process_page(Arc::clone(&self.ctx), url.clone(), is_seed);
                self.in_flight.insert(tasks.spawn(page).id(), url);
            }

            if tasks.is_empty() {
                break;
            }

            if self.frontier.is_empty() || self.budget.is_exhausted() {
                self.control.advance(CrawlStatus::Draining);
            }

            match tasks.join_next_with_id().await {
                Some(Ok((id, outcome))) => {
                    self.in_flight.remove(&id);
                    self.handle_outcome(outcome);
                }
                Some(Err(e)) => self.handle_task_failure(e),
                None => break,
            }
        }

        let stopped = self.control.is_cancelled();
        self.control.advance(CrawlStatus::Finished);

        let summary = CrawlSummary {
            started_at,
            finished_at: Utc::now(),
            elapsed: start.elapsed(),
            status: self.control.status(),
            stopped,
            pages_visited: self.pages_visited,
            pages_failed: self.pages_failed,
            links_discovered: self.frontier.seen_len(),
            budget_rejected: self.budget_rejected,
            robots_rejected: self.robots_rejected,
            issues: self.issues,
        };

        tracing::info!("Crawl of {} finished: {}", self.seed, summary);
        summary
    }

    /// Checks robots.txt and reserves budget for `url`
    async fn admit(&mut self, url: &Url) -> bool {
        if self.config.respect_robots_txt && !self.robots_allows(url).await {
            tracing::debug!("URL {} disallowed by robots.txt", url);
            self.robots_rejected += 1;
            return false;
        }

        if !self.budget.try_reserve(url) {
            tracing::debug!("URL {} is over budget", url);
            self.budget_rejected += 1;
            return false;
        }

        true
    }

    async fn robots_allows(&mut self, url: &Url) -> bool {
        let key = host_key(url);

        if self.hosts.get(&key).map_or(true, HostState::needs_robots) {
            let rules = fetch_robots(self.ctx.fetcher.as_ref(), &self.ctx.request(url.clone())).await;
            self.hosts.entry(key.clone()).or_default().robots = Some(CachedRobots::new(rules));
        } else {
            tracing::trace!("Using cached robots.txt for {}", key);
        }

        self.hosts
            .get(&key)
            .and_then(|host| host.robots.as_ref())
            .map_or(true, |robots| robots.is_allowed(url.as_str(), &self.agent))
    }

    /// Sleeps until the host of `url` may receive another request
    ///
    /// Returns early if the crawl is stopped while waiting.
    async fn wait_for_host(&mut self, url: &Url) {
        let configured = self.config.delay();
        let host = self.hosts.entry(host_key(url)).or_default();
        let delay = host.effective_delay(configured, &self.agent);

        if let Some(wait) = host.time_until_next_request(delay, Instant::now()) {
            tracing::trace!("Waiting {:?} before requesting {}", wait, url);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.control.cancelled() => {
                    tracing::debug!("Crawl stopped while waiting to request {}", url);
                    return;
                }
            }
        }

        host.record_request(Instant::now());
    }

    /// Records a page whose task panicked so it is not silently lost
    fn handle_task_failure(&mut self, error: JoinError) {
        self.pages_failed += 1;

        let Some(url) = self.in_flight.remove(&error.id()) else {
            tracing::error!("Page task failed: {}", error);
            return;
        };

        tracing::error!("Page task for {} failed: {}", url, error);
        self.visited.mark_visited(url.as_str());
        self.pages_visited += 1;

        let message = match error.try_into_panic() {
            Ok(panic) => panic_message(panic.as_ref()),
            Err(error) => error.to_string(),
        };
        self.issues
            .push(CrawlIssue::new(url.as_str(), PageError::Panicked(message)));
    }

    fn handle_outcome(&mut self, outcome: PageOutcome) {
        self.visited.mark_visited(outcome.url.as_str());
        self.pages_visited += 1;
        if outcome.failed {
            self.pages_failed += 1;
        }
        self.issues.extend(outcome.issues);

        if let Some(final_url) = outcome.final_url.filter(|u| *u != outcome.url) {
            if outcome.url == self.seed && self.frontier.alias_seed_host(&final_url) {
                tracing::info!(
                    "Seed {} redirected to {}, following links on {}",
                    self.seed,
                    final_url,
                    host_key(&final_url)
                );
            }
            self.frontier.mark_seen(final_url);
        }

        if self.control.is_cancelled() {
            tracing::debug!(
                "Crawl stopped, dropping {} links from {}",
                outcome.links.len(),
                outcome.url
            );
            return;
        }

        if self.budget.is_exhausted() {
            tracing::debug!(
                "Budget spent, not queuing {} links from {}",
                outcome.links.len(),
                outcome.url
            );
            return;
        }

        let found = outcome.links.len();
        let queued = outcome
            .links
            .into_iter()
            .map(|link| self.frontier.enqueue(link))
            .filter(|queued| *queued)
            .count();
        tracing::debug!(
            "Queued {} of {} links from {} ({} pending)",
            queued,
            found,
            outcome.url,
            self.frontier.queued_len()
        );

        if !self.frontier.is_empty() {
            self.control.advance(CrawlStatus::Running);
        }
    }
}

/// Key for per-host state: host plus explicit port
fn host_key(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

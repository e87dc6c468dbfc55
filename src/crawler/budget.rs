//! Request budgets per URL pattern
//!
//! A budget maps a pattern to the maximum number of pages matching it that may
//! be fetched in one crawl. Slots are reserved before the fetch starts, so
//! concurrent workers can never overshoot a limit.

use crate::config::GLOBAL_BUDGET_PATTERN;
use std::collections::BTreeMap;
use url::Url;

/// Which URLs a budget rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetPattern {
    /// Every URL
    Global,
    /// URLs whose full string starts with the prefix
    UrlPrefix(String),
    /// URLs whose path starts with the prefix
    PathPrefix(String),
}

impl BudgetPattern {
    /// Interprets a configured pattern
    ///
    /// `"*"` is global, anything containing `://` is a URL prefix and the
    /// rest are path prefixes. A trailing `*` is ignored, so `"/"` and `"/*"`
    /// are global too.
    pub fn parse(pattern: &str) -> Self {
        if pattern == GLOBAL_BUDGET_PATTERN {
            return Self::Global;
        }

        let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
        if prefix.contains("://") {
            Self::UrlPrefix(prefix.to_string())
        } else if prefix.is_empty() || prefix == "/" {
            Self::Global
        } else {
            Self::PathPrefix(prefix.to_string())
        }
    }

    pub fn matches(&self, url: &Url) -> bool {
        match self {
            Self::Global => true,
            Self::UrlPrefix(prefix) => url.as_str().starts_with(prefix.as_str()),
            Self::PathPrefix(prefix) => url.path().starts_with(prefix.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
struct BudgetRule {
    pattern: BudgetPattern,
    limit: u32,
    used: u32,
}

/// Counts fetches against every configured budget rule
#[derive(Debug, Clone, Default)]
pub struct BudgetController {
    rules: Vec<BudgetRule>,
}

impl BudgetController {
    /// Builds a controller with all counters at zero
    pub fn new(budget: &BTreeMap<String, u32>) -> Self {
        Self {
            rules: budget
                .iter()
                .map(|(pattern, limit)| BudgetRule {
                    pattern: BudgetPattern::parse(pattern),
                    limit: *limit,
                    used: 0,
                })
                .collect(),
        }
    }

    /// Reserves a fetch for `url`
    ///
    /// Either every matching counter is incremented or none is.
    ///
    /// # Returns
    ///
    /// * `true` - The fetch may proceed
    /// * `false` - A matching rule is exhausted
    pub fn try_reserve(&mut self, url: &Url) -> bool {
        let exhausted = self
            .rules
            .iter()
            .any(|rule| rule.pattern.matches(url) && rule.used >= rule.limit);
        if exhausted {
            return false;
        }

        for rule in self.rules.iter_mut().filter(|r| r.pattern.matches(url)) {
            rule.used += 1;
        }
        true
    }

    /// Returns true once a global rule is spent, so no further URL can be accepted
    pub fn is_exhausted(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.pattern == BudgetPattern::Global && rule.used >= rule.limit)
    }
}

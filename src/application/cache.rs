use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::{BusinessUnit, Scope, YearlyRevenue};

use super::{
    AgeReport, AggregationSource, AppError, LeagueReport, NflTeamReport, RevenueReport,
    RevenueService, ScopeSummary, StateReport, TrendReport, UnitBreakdownReport,
};

/// Identity of a cached report: which report, with which arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub report: &'static str,
    pub args: String,
}

impl CacheKey {
    pub fn new(report: &'static str, args: impl Into<String>) -> Self {
        Self {
            report,
            args: args.into(),
        }
    }
}

struct CacheEntry {
    value: serde_json::Value,
    expires_at: DateTime<Utc>,
}

/// Time-boxed store of report results.
///
/// Entries expire a fixed TTL after insertion. Callers pass the current time
/// in, so expiry can be exercised without a clock.
pub struct ReportCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ReportCache {
    pub const DEFAULT_TTL_SECS: i64 = 3600;

    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry. Expired entries are dropped.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<T> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let entry = entries.get(key)?;
        if entry.expires_at <= now {
            entries.remove(key);
            return None;
        }

        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(report = key.report, args = %key.args, error = %e, "discarding unreadable cache entry");
                entries.remove(key);
                None
            }
        }
    }

    pub fn insert<T: Serialize>(
        &self,
        key: CacheKey,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<(), serde_json::Error> {
        let entry = CacheEntry {
            value: serde_json::to_value(value)?,
            expires_at: now + self.ttl,
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
        Ok(())
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored entries, including ones that have expired but were
    /// not looked up since.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new(Duration::seconds(Self::DEFAULT_TTL_SECS))
    }
}

/// [`RevenueService`] with every report served through a [`ReportCache`].
pub struct CachedReports<S> {
    service: RevenueService<S>,
    cache: ReportCache,
}

impl<S: AggregationSource> CachedReports<S> {
    pub fn new(service: RevenueService<S>, cache: ReportCache) -> Self {
        Self { service, cache }
    }

    pub fn service(&self) -> &RevenueService<S> {
        &self.service
    }

    pub fn cache(&self) -> &ReportCache {
        &self.cache
    }

    /// Forget every cached report.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub async fn revenue_by_year(&self, scope: Scope) -> Result<YearlyRevenue, AppError> {
        let years = self.service.years();
        self.cached(
            self.key("revenue_by_year", scope),
            |r: &YearlyRevenue| r.covers(years),
            || self.service.revenue_by_year(scope),
        )
        .await
    }

    pub async fn revenue_report(&self, scope: Scope) -> Result<RevenueReport, AppError> {
        let years = self.service.years();
        self.cached(
            self.key("revenue_report", scope),
            |r: &RevenueReport| r.by_year.covers(years),
            || self.service.revenue_report(scope),
        )
        .await
    }

    pub async fn total_fans(&self, scope: Scope) -> Result<u64, AppError> {
        self.cached(self.key("total_fans", scope), always, || {
            self.service.total_fans(scope)
        })
        .await
    }

    pub async fn unit_breakdown(&self) -> Result<UnitBreakdownReport, AppError> {
        self.cached(CacheKey::new("unit_breakdown", ""), always, || {
            self.service.unit_breakdown()
        })
        .await
    }

    pub async fn league_preferences(&self, scope: Scope) -> Result<LeagueReport, AppError> {
        self.cached(self.key("league_preferences", scope), always, || {
            self.service.league_preferences(scope)
        })
        .await
    }

    pub async fn scope_summary(&self, scope: Scope) -> Result<ScopeSummary, AppError> {
        let years = self.service.years();
        self.cached(
            self.key("scope_summary", scope),
            |s: &ScopeSummary| s.revenue.by_year.covers(years),
            || self.service.scope_summary(scope),
        )
        .await
    }

    pub async fn age_demographics(&self, scope: Scope) -> Result<AgeReport, AppError> {
        self.cached(self.key("age_demographics", scope), always, || {
            self.service.age_demographics(scope)
        })
        .await
    }

    pub async fn top_states(&self, limit: u32) -> Result<StateReport, AppError> {
        self.cached(CacheKey::new("top_states", limit.to_string()), always, || {
            self.service.top_states(limit)
        })
        .await
    }

    pub async fn top_nfl_teams(&self, limit: u32) -> Result<NflTeamReport, AppError> {
        self.cached(CacheKey::new("top_nfl_teams", limit.to_string()), always, || {
            self.service.top_nfl_teams(limit)
        })
        .await
    }

    pub async fn monthly_trends(
        &self,
        unit: BusinessUnit,
        as_of: NaiveDate,
    ) -> Result<TrendReport, AppError> {
        self.cached(
            CacheKey::new("monthly_trends", format!("{}|{}", unit.as_str(), as_of)),
            always,
            || self.service.monthly_trends(unit, as_of),
        )
        .await
    }

    // Reporting years are part of every scoped key: they change the result
    // shape.
    fn key(&self, report: &'static str, scope: Scope) -> CacheKey {
        CacheKey::new(
            report,
            format!("{}|{}", scope.as_str(), self.service.years()),
        )
    }

    /// Serve `key` from the cache when a live entry passes `is_current`,
    /// otherwise compute and store it.
    async fn cached<T, C, F, Fut>(&self, key: CacheKey, is_current: C, compute: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        C: Fn(&T) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        match self.cache.get::<T>(&key, Utc::now()) {
            Some(hit) if is_current(&hit) => {
                debug!(report = key.report, args = %key.args, "cache hit");
                return Ok(hit);
            }
            Some(_) => {
                warn!(report = key.report, args = %key.args, "discarding stale cache entry");
            }
            None => {}
        }

        let value = compute().await?;
        if let Err(e) = self.cache.insert(key, &value, Utc::now()) {
            warn!(error = %e, "report not cached");
        }
        Ok(value)
    }
}

fn always<T>(_: &T) -> bool {
    true
}

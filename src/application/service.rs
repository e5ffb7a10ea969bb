use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use tracing::{debug, warn};

use crate::domain::{
    AGE_RANGE_COLUMN, AggregateRow, AggregationRequest, BusinessUnit, FAN_TABLE,
    LEDGER_FAN_COLUMN, LEDGER_ID_COLUMN, League, NFL_TEAM_COLUMN, NFL_TEAM_TABLE, ReportingYears,
    RevenueSource, RowIssue, STATE_COLUMN, Scope, SumTarget, YearlyRevenue, contribution,
};

use super::{
    AgeReport, AggregationSource, AppError, LeagueFanCount, LeagueReport, MonthlyTrend,
    NflTeamReport, RevenueReport, ScopeSummary, StateReport, TrendReport, UnitBreakdownReport,
    UnitFanCount, ValueFanCount, percentage,
};

/// States shown by default in the geographic breakdown.
pub const TOP_STATES: u32 = 20;
/// Teams shown by default in the NFL team breakdown.
pub const TOP_NFL_TEAMS: u32 = 15;
/// Calendar months covered by a trend report, the current one included.
pub const TREND_MONTHS: u32 = 24;

/// Report service over an aggregation source.
/// This is the primary interface for any client (CLI, API, dashboard, etc.).
pub struct RevenueService<S> {
    source: S,
    years: ReportingYears,
}

impl<S: AggregationSource> RevenueService<S> {
    pub fn new(source: S, years: ReportingYears) -> Self {
        Self { source, years }
    }

    pub fn years(&self) -> &ReportingYears {
        &self.years
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve a scope name ("all" or a unit name/label).
    pub fn parse_scope(name: &str) -> Result<Scope, AppError> {
        Scope::from_str(name).ok_or_else(|| AppError::UnrecognizedScope(name.to_string()))
    }

    // ========================
    // Revenue
    // ========================

    /// Gross revenue per reporting year for `scope`.
    ///
    /// Ledger units contribute their year-grouped sums; lifetime units have
    /// their total split evenly across the reporting years. A single-unit
    /// scope only ever queries that unit's own source, and lifetime counters
    /// are then restricted to the unit's member fans.
    pub async fn revenue_by_year(&self, scope: Scope) -> Result<YearlyRevenue, AppError> {
        let member_only = scope.unit().is_some();
        let mut revenue = YearlyRevenue::zeroed(&self.years);

        for unit in scope.units() {
            let request = AggregationRequest::revenue(unit.descriptor(), &self.years, member_only);
            let rows = self.fetch(&request).await?;

            let unit_revenue = contribution(unit.source_kind(), &rows, &self.years);
            report_issues(unit, &request, &unit_revenue.issues);
            revenue.merge(&unit_revenue.revenue);
        }

        Ok(revenue)
    }

    /// Like [`Self::revenue_by_year`], for a scope given by name. Unknown
    /// names fail with [`AppError::UnrecognizedScope`] before any query runs.
    pub async fn revenue_by_scope_name(&self, name: &str) -> Result<YearlyRevenue, AppError> {
        let scope = Self::parse_scope(name)?;
        self.revenue_by_year(scope).await
    }

    pub async fn revenue_report(&self, scope: Scope) -> Result<RevenueReport, AppError> {
        let by_year = self.revenue_by_year(scope).await?;
        let total = by_year.total();
        Ok(RevenueReport {
            scope,
            by_year,
            total,
        })
    }

    // ========================
    // Fans
    // ========================

    /// Number of fans in scope.
    pub async fn total_fans(&self, scope: Scope) -> Result<u64, AppError> {
        self.count(&AggregationRequest::fan_count(membership_filter(scope)))
            .await
    }

    /// Fan count per business unit, largest first.
    pub async fn unit_breakdown(&self) -> Result<UnitBreakdownReport, AppError> {
        let total_fans = self.total_fans(Scope::AllUnits).await?;

        let mut units = Vec::with_capacity(BusinessUnit::ALL.len());
        for unit in BusinessUnit::ALL {
            let request = AggregationRequest::flag_count(unit.descriptor().membership_column, None);
            let fans = self.count(&request).await?;
            units.push(UnitFanCount {
                unit,
                fans,
                percentage: percentage(fans, total_fans),
            });
        }
        units.sort_by(|a, b| b.fans.cmp(&a.fans));

        Ok(UnitBreakdownReport { total_fans, units })
    }

    /// Fans preferring each league within scope, largest first.
    pub async fn league_preferences(&self, scope: Scope) -> Result<LeagueReport, AppError> {
        let filter = membership_filter(scope);

        let mut leagues = Vec::with_capacity(League::ALL.len());
        for league in League::ALL {
            let request = AggregationRequest::flag_count(league.preference_column(), filter);
            let fans = self.count(&request).await?;
            leagues.push(LeagueFanCount { league, fans });
        }
        leagues.sort_by(|a, b| b.fans.cmp(&a.fans));

        Ok(LeagueReport { scope, leagues })
    }

    /// KPI figures for the overview of one scope.
    pub async fn scope_summary(&self, scope: Scope) -> Result<ScopeSummary, AppError> {
        let fans = self.total_fans(scope).await?;
        let all_fans = match scope {
            Scope::AllUnits => fans,
            Scope::Unit(_) => self.total_fans(Scope::AllUnits).await?,
        };
        let top_league = self.league_preferences(scope).await?.top_league();
        let age_ranges = self.age_demographics(scope).await?.age_ranges;
        let revenue = self.revenue_report(scope).await?;

        Ok(ScopeSummary {
            scope,
            fans,
            all_fans,
            share_of_all_fans: percentage(fans, all_fans),
            top_league,
            age_ranges,
            revenue,
        })
    }

    // ========================
    // Demographics
    // ========================

    /// Fans per age range within scope, largest first. Fans without an age
    /// range are left out.
    pub async fn age_demographics(&self, scope: Scope) -> Result<AgeReport, AppError> {
        let request = AggregationRequest::value_count(FAN_TABLE, AGE_RANGE_COLUMN)
            .with_filter(membership_filter(scope));
        let age_ranges = self.count_by_value(&request).await?;
        Ok(AgeReport { scope, age_ranges })
    }

    /// The `limit` states with the most fans. Only two-letter state codes
    /// count.
    pub async fn top_states(&self, limit: u32) -> Result<StateReport, AppError> {
        let request = AggregationRequest::value_count(FAN_TABLE, STATE_COLUMN)
            .with_value_length(2)
            .with_limit(limit);
        let states = self.count_by_value(&request).await?;
        Ok(StateReport { states })
    }

    /// The `limit` NFL teams named as favourite by the most fans.
    pub async fn top_nfl_teams(&self, limit: u32) -> Result<NflTeamReport, AppError> {
        let request =
            AggregationRequest::value_count(NFL_TEAM_TABLE, NFL_TEAM_COLUMN).with_limit(limit);
        let teams = self.count_by_value(&request).await?;
        Ok(NflTeamReport { teams })
    }

    /// Orders, distinct customers and revenue per month of a ledger-backed
    /// unit, over the [`TREND_MONTHS`] calendar months ending with the month
    /// of `as_of`.
    pub async fn monthly_trends(
        &self,
        unit: BusinessUnit,
        as_of: NaiveDate,
    ) -> Result<TrendReport, AppError> {
        let descriptor = unit.descriptor();
        let RevenueSource::TransactionLedger { amount_column, .. } = descriptor.revenue else {
            return Err(AppError::InvalidInput(format!(
                "{} has no transaction ledger to trend",
                unit
            )));
        };
        let since = trend_start(as_of)?;
        let monthly = |sum| {
            AggregationRequest::monthly(descriptor, sum, since).ok_or_else(|| {
                AppError::InvalidInput(format!("{} has no transaction ledger to trend", unit))
            })
        };

        let orders = self
            .labelled_totals(&monthly(SumTarget::Distinct(LEDGER_ID_COLUMN))?)
            .await?;
        let customers = self
            .labelled_totals(&monthly(SumTarget::Distinct(LEDGER_FAN_COLUMN))?)
            .await?;
        let revenue = self
            .labelled_totals(&monthly(SumTarget::Column(amount_column))?)
            .await?;

        let mut months: BTreeMap<String, MonthlyTrend> = BTreeMap::new();
        for (label, total) in orders {
            month_entry(&mut months, label).orders = total.round() as u64;
        }
        for (label, total) in customers {
            month_entry(&mut months, label).customers = total.round() as u64;
        }
        for (label, total) in revenue {
            month_entry(&mut months, label).revenue += total;
        }

        Ok(TrendReport {
            unit,
            since,
            months: months.into_values().collect(),
        })
    }

    // ========================
    // Helpers
    // ========================

    async fn fetch(&self, request: &AggregationRequest) -> Result<Vec<AggregateRow>, AppError> {
        debug!(request = %request, "aggregating");
        self.source
            .aggregate(request)
            .await
            .map_err(|e| AppError::DataSourceUnavailable(format!("{:#}", e)))
    }

    async fn count(&self, request: &AggregationRequest) -> Result<u64, AppError> {
        let rows = self.fetch(request).await?;
        let mut total = 0.0;
        for row in rows {
            match row.total {
                None => {}
                Some(t) if t.is_finite() && t >= 0.0 => total += t,
                Some(t) => {
                    let err = AppError::MalformedSourceRow {
                        source_name: request.to_string(),
                        reason: format!("count {} is not a valid number", t),
                    };
                    warn!("{}; counted as zero", err);
                }
            }
        }
        Ok(total.round() as u64)
    }

    /// `(label, total)` per labelled row, in source order. Rows without a
    /// label or with an unusable total are logged and skipped.
    async fn labelled_totals(
        &self,
        request: &AggregationRequest,
    ) -> Result<Vec<(String, f64)>, AppError> {
        let rows = self.fetch(request).await?;
        let mut totals = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let reason = match (row.label, row.total) {
                (Some(label), None) => {
                    totals.push((label, 0.0));
                    continue;
                }
                (Some(label), Some(t)) if t.is_finite() && t >= 0.0 => {
                    totals.push((label, t));
                    continue;
                }
                (Some(_), Some(t)) => format!("row {}: total {} is not a valid number", index, t),
                (None, _) => format!("row {}: group label is missing", index),
            };
            let err = AppError::MalformedSourceRow {
                source_name: request.to_string(),
                reason,
            };
            warn!("{}; skipped", err);
        }
        Ok(totals)
    }

    /// Fan counts per label, largest first, at most `request.limit` of them.
    async fn count_by_value(
        &self,
        request: &AggregationRequest,
    ) -> Result<Vec<ValueFanCount>, AppError> {
        let mut counts: Vec<ValueFanCount> = self
            .labelled_totals(request)
            .await?
            .into_iter()
            .map(|(value, total)| ValueFanCount {
                value,
                fans: total.round() as u64,
            })
            .collect();
        counts.sort_by(|a, b| b.fans.cmp(&a.fans).then_with(|| a.value.cmp(&b.value)));
        if let Some(limit) = request.limit {
            counts.truncate(limit as usize);
        }
        Ok(counts)
    }
}

fn membership_filter(scope: Scope) -> Option<&'static str> {
    scope.unit().map(|u| u.descriptor().membership_column)
}

/// First day of the oldest month in a trend window ending at `as_of`.
fn trend_start(as_of: NaiveDate) -> Result<NaiveDate, AppError> {
    as_of
        .with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(TREND_MONTHS - 1)))
        .ok_or_else(|| AppError::InvalidInput(format!("no trend window ends at {}", as_of)))
}

fn month_entry(months: &mut BTreeMap<String, MonthlyTrend>, label: String) -> &mut MonthlyTrend {
    months.entry(label.clone()).or_insert_with(|| MonthlyTrend {
        month: label,
        orders: 0,
        customers: 0,
        revenue: 0.0,
    })
}

fn report_issues(unit: BusinessUnit, request: &AggregationRequest, issues: &[RowIssue]) {
    for issue in issues {
        let err = AppError::MalformedSourceRow {
            source_name: request.to_string(),
            reason: format!("row {}: {}", issue.index, issue.reason),
        };
        warn!(unit = unit.as_str(), "{}; treated as zero", err);
    }
}

use serde::{Deserialize, Serialize};

use chrono::NaiveDate;

use crate::domain::{Amount, BusinessUnit, League, Scope, YearlyRevenue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueReport {
    pub scope: Scope,
    pub by_year: YearlyRevenue,
    pub total: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitBreakdownReport {
    pub total_fans: u64,
    /// Sorted by fan count, largest first.
    pub units: Vec<UnitFanCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFanCount {
    pub unit: BusinessUnit,
    pub fans: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueReport {
    pub scope: Scope,
    /// Sorted by fan count, largest first.
    pub leagues: Vec<LeagueFanCount>,
}

impl LeagueReport {
    /// The most preferred league, if any fan in scope has a preference.
    pub fn top_league(&self) -> Option<League> {
        self.leagues
            .first()
            .filter(|l| l.fans > 0)
            .map(|l| l.league)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueFanCount {
    pub league: League,
    pub fans: u64,
}

/// Fans sharing one value of a text attribute (age range, state, team).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFanCount {
    pub value: String,
    pub fans: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeReport {
    pub scope: Scope,
    /// Fans without an age range are left out. Largest first.
    pub age_ranges: Vec<ValueFanCount>,
}

/// Fans per two-letter state code, largest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateReport {
    pub states: Vec<ValueFanCount>,
}

/// Fans per favourite NFL team, largest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NflTeamReport {
    pub teams: Vec<ValueFanCount>,
}

/// Activity of a ledger-backed unit in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub orders: u64,
    pub customers: u64,
    pub revenue: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub unit: BusinessUnit,
    /// First day of the earliest month covered.
    pub since: NaiveDate,
    /// Months with activity, oldest first.
    pub months: Vec<MonthlyTrend>,
}

/// KPI figures for one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeSummary {
    pub scope: Scope,
    pub fans: u64,
    pub all_fans: u64,
    /// Share of all fans in scope, in percent. Zero when there are no fans.
    pub share_of_all_fans: f64,
    pub top_league: Option<League>,
    pub age_ranges: Vec<ValueFanCount>,
    pub revenue: RevenueReport,
}

/// `part` as a percentage of `whole`, or zero when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

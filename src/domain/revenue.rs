use std::fmt;

use super::{AggregateRow, Amount, ReportingYears, RevenueSourceKind, YearlyRevenue};

/// A source row that could not be used. It contributes nothing to the result.
#[derive(Debug, Clone, PartialEq)]
pub struct RowIssue {
    pub index: usize,
    pub reason: RowIssueReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowIssueReason {
    MissingYear,
    UnsupportedYear(i64),
    InvalidTotal(f64),
}

impl fmt::Display for RowIssueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssueReason::MissingYear => write!(f, "year is missing or not an integer"),
            RowIssueReason::UnsupportedYear(y) => write!(f, "year {} is not a reporting year", y),
            RowIssueReason::InvalidTotal(t) => write!(f, "total {} is not a valid amount", t),
        }
    }
}

/// A unit's contribution to yearly revenue, plus the rows that were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub revenue: YearlyRevenue,
    pub issues: Vec<RowIssue>,
}

/// Turn one unit's source rows into yearly revenue.
pub fn contribution(
    kind: RevenueSourceKind,
    rows: &[AggregateRow],
    years: &ReportingYears,
) -> Contribution {
    match kind {
        RevenueSourceKind::TransactionLedger => ledger_contribution(rows, years),
        RevenueSourceKind::LifetimeAggregate => lifetime_contribution(rows, years),
    }
}

/// Each `(year, total)` row is added to its year. Rows for the same year
/// accumulate.
pub fn ledger_contribution(rows: &[AggregateRow], years: &ReportingYears) -> Contribution {
    let mut revenue = YearlyRevenue::zeroed(years);
    let mut issues = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let total = match checked_total(row.total) {
            Ok(total) => total,
            Err(reason) => {
                issues.push(RowIssue { index, reason });
                continue;
            }
        };

        let Some(year) = row.key else {
            issues.push(RowIssue {
                index,
                reason: RowIssueReason::MissingYear,
            });
            continue;
        };

        let added = i32::try_from(year)
            .map(|y| revenue.add(y, total))
            .unwrap_or(false);
        if !added {
            issues.push(RowIssue {
                index,
                reason: RowIssueReason::UnsupportedYear(year),
            });
        }
    }

    Contribution { revenue, issues }
}

/// Lifetime counters carry no temporal signal: the summed total is split
/// evenly across the reporting years.
pub fn lifetime_contribution(rows: &[AggregateRow], years: &ReportingYears) -> Contribution {
    let mut total = 0.0;
    let mut issues = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match checked_total(row.total) {
            Ok(amount) => total += amount,
            Err(reason) => issues.push(RowIssue { index, reason }),
        }
    }

    Contribution {
        revenue: split_evenly(total, years),
        issues,
    }
}

/// `total / years.len()` for every year. `years` is never empty.
pub fn split_evenly(total: Amount, years: &ReportingYears) -> YearlyRevenue {
    let share = total / years.len() as f64;
    let mut revenue = YearlyRevenue::zeroed(years);
    for year in years.iter() {
        revenue.add(year, share);
    }
    revenue
}

// NULL sums come from empty tables and count as zero.
fn checked_total(total: Option<f64>) -> Result<Amount, RowIssueReason> {
    match total {
        None => Ok(0.0),
        Some(t) if t.is_finite() && t >= 0.0 => Ok(t),
        Some(t) => Err(RowIssueReason::InvalidTotal(t)),
    }
}

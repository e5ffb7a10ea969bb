use chrono::NaiveDate;

use super::{FAN_TABLE, ReportingYears, RevenueSource, SourceDescriptor};

/// How rows are grouped before summing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// A single row for the whole (filtered) table.
    Nothing,
    /// One row per calendar year of the given timestamp column.
    YearOf(&'static str),
    /// One row per calendar month (`YYYY-MM`) of the given timestamp column.
    MonthOf(&'static str),
    /// One row per distinct non-NULL value of a text column, largest total
    /// first.
    Value(&'static str),
}

impl GroupBy {
    /// Timestamp column the grouping reads, if any.
    pub fn timestamp_column(&self) -> Option<&'static str> {
        match self {
            GroupBy::YearOf(column) | GroupBy::MonthOf(column) => Some(*column),
            GroupBy::Nothing | GroupBy::Value(_) => None,
        }
    }
}

/// What gets summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumTarget {
    /// Each row counts as 1.
    Rows,
    Column(&'static str),
    /// The columns are coalesced to zero and added per row before summing.
    Columns(&'static [&'static str]),
    /// Number of distinct non-NULL values of the column.
    Distinct(&'static str),
}

impl SumTarget {
    pub fn columns(&self) -> &[&'static str] {
        match self {
            SumTarget::Rows => &[],
            SumTarget::Column(column) | SumTarget::Distinct(column) => std::slice::from_ref(column),
            SumTarget::Columns(columns) => columns,
        }
    }
}

/// A read-only aggregation over one source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRequest {
    pub table: &'static str,
    pub group_by: GroupBy,
    pub sum: SumTarget,
    /// Boolean column a row must have set to be included.
    pub filter: Option<&'static str>,
    /// Restricts `YearOf` groups to these years.
    pub years: Option<ReportingYears>,
    /// Only rows whose grouping timestamp is on or after this day.
    pub since: Option<NaiveDate>,
    /// Restricts `Value` groups to values of exactly this many characters.
    pub value_length: Option<u32>,
    /// At most this many groups.
    pub limit: Option<u32>,
}

impl AggregationRequest {
    fn over(table: &'static str, group_by: GroupBy, sum: SumTarget) -> Self {
        Self {
            table,
            group_by,
            sum,
            filter: None,
            years: None,
            since: None,
            value_length: None,
            limit: None,
        }
    }

    /// Year-grouped revenue for a ledger-backed unit, or the scalar lifetime
    /// total for a lifetime-aggregate unit. `member_only` restricts lifetime
    /// counters to fans flagged as members of the unit.
    pub fn revenue(descriptor: &SourceDescriptor, years: &ReportingYears, member_only: bool) -> Self {
        match descriptor.revenue {
            RevenueSource::TransactionLedger {
                table,
                timestamp_column,
                amount_column,
            } => Self {
                years: Some(years.clone()),
                ..Self::over(
                    table,
                    GroupBy::YearOf(timestamp_column),
                    SumTarget::Column(amount_column),
                )
            },
            RevenueSource::LifetimeAggregate { counter_columns } => Self {
                filter: member_only.then_some(descriptor.membership_column),
                ..Self::over(FAN_TABLE, GroupBy::Nothing, SumTarget::Columns(counter_columns))
            },
        }
    }

    /// Month-grouped `sum` over a ledger table, from `since` on. `None` for
    /// units without a ledger.
    pub fn monthly(descriptor: &SourceDescriptor, sum: SumTarget, since: NaiveDate) -> Option<Self> {
        match descriptor.revenue {
            RevenueSource::TransactionLedger {
                table,
                timestamp_column,
                ..
            } => Some(Self {
                since: Some(since),
                ..Self::over(table, GroupBy::MonthOf(timestamp_column), sum)
            }),
            RevenueSource::LifetimeAggregate { .. } => None,
        }
    }

    /// Number of fans, optionally restricted to those with `filter` set.
    pub fn fan_count(filter: Option<&'static str>) -> Self {
        Self {
            filter,
            ..Self::over(FAN_TABLE, GroupBy::Nothing, SumTarget::Rows)
        }
    }

    /// Number of fans with the boolean `flag` column set, optionally
    /// restricted to those with `filter` set.
    pub fn flag_count(flag: &'static str, filter: Option<&'static str>) -> Self {
        Self {
            filter,
            ..Self::over(FAN_TABLE, GroupBy::Nothing, SumTarget::Column(flag))
        }
    }

    /// Number of rows of `table` per distinct value of `column`, largest
    /// first.
    pub fn value_count(table: &'static str, column: &'static str) -> Self {
        Self::over(table, GroupBy::Value(column), SumTarget::Rows)
    }

    pub fn with_filter(mut self, filter: Option<&'static str>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_value_length(mut self, length: u32) -> Self {
        self.value_length = Some(length);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl std::fmt::Display for AggregationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.sum {
            SumTarget::Rows => write!(f, "count({})", self.table)?,
            SumTarget::Distinct(column) => write!(f, "count(distinct {}.{})", self.table, column)?,
            _ => write!(f, "sum({}.{})", self.table, self.sum.columns().join("+"))?,
        }
        match self.group_by {
            GroupBy::Nothing => {}
            GroupBy::YearOf(column) => write!(f, " by year({})", column)?,
            GroupBy::MonthOf(column) => write!(f, " by month({})", column)?,
            GroupBy::Value(column) => write!(f, " by {}", column)?,
        }
        if let Some(filter) = self.filter {
            write!(f, " where {}", filter)?;
        }
        if let Some(since) = self.since {
            write!(f, " since {}", since)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {}", limit)?;
        }
        Ok(())
    }
}

/// A row handed back by the aggregation source. `None` means the value was
/// NULL or could not be decoded.
///
/// Year groups carry their key in `key`; month and value groups in `label`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: Option<i64>,
    pub label: Option<String>,
    pub total: Option<f64>,
}

impl AggregateRow {
    pub fn new(key: Option<i64>, total: Option<f64>) -> Self {
        Self {
            key,
            label: None,
            total,
        }
    }

    pub fn year(year: i64, total: f64) -> Self {
        Self::new(Some(year), Some(total))
    }

    pub fn scalar(total: f64) -> Self {
        Self::new(None, Some(total))
    }

    pub fn labelled(label: impl Into<String>, total: f64) -> Self {
        Self {
            key: None,
            label: Some(label.into()),
            total: Some(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AGE_RANGE_COLUMN, BusinessUnit};

    #[test]
    fn test_ledger_revenue_request() {
        let years = ReportingYears::default();
        let request = AggregationRequest::revenue(BusinessUnit::Commerce.descriptor(), &years, true);

        assert_eq!(request.table, "commerce_purchases");
        assert_eq!(request.group_by, GroupBy::YearOf("ordered_at"));
        assert_eq!(request.sum, SumTarget::Column("gross_demand"));
        assert_eq!(request.filter, None);
        assert_eq!(request.years, Some(years));
        assert_eq!(request.limit, None);
    }

    #[test]
    fn test_lifetime_revenue_request_filter() {
        let years = ReportingYears::default();
        let descriptor = BusinessUnit::DigitalCollectibles.descriptor();

        let member_only = AggregationRequest::revenue(descriptor, &years, true);
        assert_eq!(member_only.table, FAN_TABLE);
        assert_eq!(member_only.group_by, GroupBy::Nothing);
        assert_eq!(member_only.sum.columns().len(), 5);
        assert_eq!(member_only.filter, Some("digital_collectibles_fan"));

        let everyone = AggregationRequest::revenue(descriptor, &years, false);
        assert_eq!(everyone.filter, None);
    }

    #[test]
    fn test_monthly_request_only_for_ledgers() {
        let since = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let request = AggregationRequest::monthly(
            BusinessUnit::Commerce.descriptor(),
            SumTarget::Distinct("fan_id"),
            since,
        )
        .unwrap();
        assert_eq!(request.group_by, GroupBy::MonthOf("ordered_at"));
        assert_eq!(request.group_by.timestamp_column(), Some("ordered_at"));
        assert_eq!(request.since, Some(since));

        assert!(
            AggregationRequest::monthly(BusinessUnit::Live.descriptor(), SumTarget::Rows, since)
                .is_none()
        );
    }

    #[test]
    fn test_display() {
        let request = AggregationRequest::flag_count("prefers_nfl", Some("live_fan"));
        assert_eq!(request.to_string(), "sum(fans.prefers_nfl) where live_fan");
        assert_eq!(
            AggregationRequest::fan_count(None).to_string(),
            "count(fans)"
        );
        assert_eq!(
            AggregationRequest::value_count(FAN_TABLE, AGE_RANGE_COLUMN)
                .with_limit(5)
                .to_string(),
            "count(fans) by age_range limit 5"
        );
    }
}

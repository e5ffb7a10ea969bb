use anyhow::Result;
use std::io::Write;

use crate::application::{
    LeagueReport, RevenueReport, ScopeSummary, TrendReport, UnitBreakdownReport, ValueFanCount,
};

/// Writes reports as CSV.
pub struct Exporter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> Exporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// One row per reporting year.
    pub fn revenue_csv(mut self, report: &RevenueReport) -> Result<usize> {
        self.writer.write_record(["scope", "year", "revenue"])?;

        let mut count = 0;
        for (year, amount) in report.by_year.iter() {
            self.writer.write_record([
                report.scope.as_str().to_string(),
                year.to_string(),
                format!("{:.2}", amount),
            ])?;
            count += 1;
        }

        self.writer.flush()?;
        Ok(count)
    }

    pub fn unit_breakdown_csv(mut self, report: &UnitBreakdownReport) -> Result<usize> {
        self.writer.write_record(["unit", "fans", "percentage"])?;
        let total_fans = report.total_fans.to_string();
        self.writer
            .write_record(["total", total_fans.as_str(), "100.00"])?;

        for unit in &report.units {
            self.writer.write_record([
                unit.unit.as_str().to_string(),
                unit.fans.to_string(),
                format!("{:.2}", unit.percentage),
            ])?;
        }

        self.writer.flush()?;
        Ok(report.units.len())
    }

    pub fn leagues_csv(mut self, report: &LeagueReport) -> Result<usize> {
        self.writer.write_record(["scope", "league", "fans"])?;

        for league in &report.leagues {
            self.writer.write_record([
                report.scope.as_str().to_string(),
                league.league.as_str().to_string(),
                league.fans.to_string(),
            ])?;
        }

        self.writer.flush()?;
        Ok(report.leagues.len())
    }

    /// Fan counts keyed by `label` (age range, state, team).
    pub fn value_counts_csv(mut self, label: &str, counts: &[ValueFanCount]) -> Result<usize> {
        self.writer.write_record([label, "fans"])?;

        for count in counts {
            self.writer
                .write_record([count.value.clone(), count.fans.to_string()])?;
        }

        self.writer.flush()?;
        Ok(counts.len())
    }

    pub fn trends_csv(mut self, report: &TrendReport) -> Result<usize> {
        self.writer
            .write_record(["unit", "month", "orders", "customers", "revenue"])?;

        for month in &report.months {
            self.writer.write_record([
                report.unit.as_str().to_string(),
                month.month.clone(),
                month.orders.to_string(),
                month.customers.to_string(),
                format!("{:.2}", month.revenue),
            ])?;
        }

        self.writer.flush()?;
        Ok(report.months.len())
    }

    /// A single row; revenue columns follow the reporting years.
    pub fn summary_csv(mut self, summary: &ScopeSummary) -> Result<usize> {
        let mut header = vec![
            "scope".to_string(),
            "fans".to_string(),
            "share_of_all_fans".to_string(),
            "top_league".to_string(),
        ];
        header.extend(summary.revenue.by_year.years().map(|y| format!("revenue_{}", y)));
        self.writer.write_record(&header)?;

        let mut row = vec![
            summary.scope.as_str().to_string(),
            summary.fans.to_string(),
            format!("{:.2}", summary.share_of_all_fans),
            summary
                .top_league
                .map(|l| l.as_str().to_string())
                .unwrap_or_default(),
        ];
        row.extend(summary.revenue.by_year.iter().map(|(_, a)| format!("{:.2}", a)));
        self.writer.write_record(&row)?;

        self.writer.flush()?;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReportingYears, Scope, YearlyRevenue};

    #[test]
    fn test_revenue_csv() {
        let mut by_year = YearlyRevenue::zeroed(&ReportingYears::default());
        by_year.add(2024, 400.0);
        by_year.add(2025, 450.5);
        let report = RevenueReport {
            scope: Scope::AllUnits,
            total: by_year.total(),
            by_year,
        };

        let mut out = Vec::new();
        let rows = Exporter::new(&mut out).revenue_csv(&report).unwrap();

        assert_eq!(rows, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "scope,year,revenue\nall,2024,400.00\nall,2025,450.50\n"
        );
    }

    #[test]
    fn test_value_counts_csv() {
        let counts = vec![
            ValueFanCount {
                value: "NY".into(),
                fans: 12,
            },
            ValueFanCount {
                value: "CA".into(),
                fans: 7,
            },
        ];

        let mut out = Vec::new();
        let rows = Exporter::new(&mut out)
            .value_counts_csv("state", &counts)
            .unwrap();

        assert_eq!(rows, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "state,fans\nNY,12\nCA,7\n");
    }
}

// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use fanrev::application::RevenueService;
use fanrev::{BusinessUnit, FanRecord, League, LedgerEntry, ReportingYears, Warehouse};
use tempfile::TempDir;

/// Helper to create a fresh warehouse in a temporary database
pub async fn test_warehouse() -> Result<(Warehouse, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let url = format!("sqlite:{}?mode=rwc", db_path.display());
    let warehouse = Warehouse::init(&url).await?;
    Ok((warehouse, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn service(warehouse: Warehouse) -> RevenueService<Warehouse> {
    RevenueService::new(warehouse, ReportingYears::default())
}

pub async fn record(
    warehouse: &Warehouse,
    unit: BusinessUnit,
    date: &str,
    amount: f64,
) -> Result<()> {
    warehouse
        .insert_ledger_entry(unit, &LedgerEntry::new(parse_date(date), amount))
        .await
}

/// Test fixture: three fans and a handful of ledger rows.
///
/// | fan | units          | leagues  | age   | NFL teams       | lifetime spend              |
/// |-----|----------------|----------|-------|-----------------|-----------------------------|
/// | f1  | live, commerce | NFL, NBA | 25-34 | Chiefs, Bills   | live 300, mobile 40         |
/// | f2  | live           | NFL      | 25-34 | Chiefs          | live 100                    |
/// | f3  | commerce       | MLB      | 18-24 |                 | live 200, digital marvel 60 |
///
/// Commerce: 150 in 2024, 200 in 2025, 999 in 2023.
/// Sportsbook: 80 in 2025.
pub struct StandardWarehouse;

impl StandardWarehouse {
    pub async fn load(warehouse: &Warehouse) -> Result<()> {
        Self::load_fans(warehouse).await?;

        record(warehouse, BusinessUnit::Commerce, "2024-03-01", 100.0).await?;
        record(warehouse, BusinessUnit::Commerce, "2024-07-04", 50.0).await?;
        record(warehouse, BusinessUnit::Commerce, "2025-01-10", 200.0).await?;
        record(warehouse, BusinessUnit::Commerce, "2023-12-31", 999.0).await?;
        record(warehouse, BusinessUnit::Sportsbook, "2025-06-01", 80.0).await?;
        Ok(())
    }

    pub async fn load_fans(warehouse: &Warehouse) -> Result<()> {
        let fans = [
            FanRecord::new("f1")
                .with_unit(BusinessUnit::Live)
                .with_unit(BusinessUnit::Commerce)
                .with_league(League::Nfl)
                .with_league(League::Nba)
                .with_age_range("25-34")
                .with_nfl_team("kansas city chiefs")
                .with_nfl_team("Buffalo Bills")
                .with_spend("live_total_revenue", 300.0)
                .with_spend("mobile_order_amount_total", 40.0),
            FanRecord::new("f2")
                .with_unit(BusinessUnit::Live)
                .with_league(League::Nfl)
                .with_age_range("25-34")
                .with_nfl_team("Kansas City Chiefs")
                .with_spend("live_total_revenue", 100.0),
            FanRecord::new("f3")
                .with_unit(BusinessUnit::Commerce)
                .with_league(League::Mlb)
                .with_state("NY")
                .with_age_range("18-24")
                .with_spend("live_total_revenue", 200.0)
                .with_spend("digital_marvel_spend_lifetime", 60.0),
        ];
        for fan in &fans {
            warehouse.insert_fan(fan).await?;
        }
        Ok(())
    }
}

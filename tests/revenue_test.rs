mod common;

use anyhow::Result;
use common::{StandardWarehouse, parse_date, record, service, test_warehouse};
use fanrev::application::{AppError, CachedReports, ReportCache, RevenueService};
use fanrev::application::MonthlyTrend;
use fanrev::{BusinessUnit, FanRecord, LedgerEntry, ReportingYears, Scope};

#[tokio::test]
async fn test_empty_warehouse_reports_zero_for_every_year() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    let service = service(warehouse);

    for scope in [
        Scope::AllUnits,
        Scope::Unit(BusinessUnit::Commerce),
        Scope::Unit(BusinessUnit::Live),
    ] {
        let revenue = service.revenue_by_year(scope).await?;
        assert_eq!(revenue.get(2024), Some(0.0));
        assert_eq!(revenue.get(2025), Some(0.0));
        assert_eq!(revenue.years().count(), 2);
    }

    Ok(())
}

#[tokio::test]
async fn test_ledger_unit_groups_by_year() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    StandardWarehouse::load(&warehouse).await?;
    let service = service(warehouse);

    let revenue = service
        .revenue_by_year(Scope::Unit(BusinessUnit::Commerce))
        .await?;

    // The 2023 order is outside the reporting years.
    assert_eq!(revenue.get(2024), Some(150.0));
    assert_eq!(revenue.get(2025), Some(200.0));
    assert_eq!(revenue.get(2023), None);

    Ok(())
}

#[tokio::test]
async fn test_lifetime_unit_splits_member_total_evenly() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    StandardWarehouse::load(&warehouse).await?;
    let service = service(warehouse);

    // Only f1 and f2 are live members: 300 + 100.
    let revenue = service.revenue_by_year(Scope::Unit(BusinessUnit::Live)).await?;
    assert_eq!(revenue.get(2024), Some(200.0));
    assert_eq!(revenue.get(2025), Some(200.0));

    Ok(())
}

#[tokio::test]
async fn test_single_unit_scope_ignores_other_units() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    StandardWarehouse::load(&warehouse).await?;
    let service = service(warehouse);

    let sportsbook = service
        .revenue_by_year(Scope::Unit(BusinessUnit::Sportsbook))
        .await?;
    assert_eq!(sportsbook.get(2024), Some(0.0));
    assert_eq!(sportsbook.get(2025), Some(80.0));

    let marketplace = service
        .revenue_by_year(Scope::Unit(BusinessUnit::Marketplace))
        .await?;
    assert_eq!(marketplace.total(), 0.0);

    Ok(())
}

#[tokio::test]
async fn test_all_units_adds_every_source() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    StandardWarehouse::load(&warehouse).await?;
    let service = service(warehouse);

    let report = service.revenue_report(Scope::AllUnits).await?;

    // commerce 150/200, sportsbook 0/80, live 600 split, mobile 40 split,
    // digital 60 split; lifetime counters are not member-filtered here.
    assert_eq!(report.by_year.get(2024), Some(500.0));
    assert_eq!(report.by_year.get(2025), Some(630.0));
    assert_eq!(report.total, 1130.0);

    Ok(())
}

#[tokio::test]
async fn test_revenue_is_stable_across_calls() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    StandardWarehouse::load(&warehouse).await?;
    let service = service(warehouse);

    let first = service.revenue_by_year(Scope::AllUnits).await?;
    let second = service.revenue_by_year(Scope::AllUnits).await?;
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_custom_reporting_years() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    StandardWarehouse::load(&warehouse).await?;
    let years = ReportingYears::new([2023, 2024, 2025, 2026])?;
    let service = RevenueService::new(warehouse, years);

    let commerce = service
        .revenue_by_year(Scope::Unit(BusinessUnit::Commerce))
        .await?;
    assert_eq!(commerce.get(2023), Some(999.0));
    assert_eq!(commerce.get(2026), Some(0.0));

    // 400 across four years.
    let live = service.revenue_by_year(Scope::Unit(BusinessUnit::Live)).await?;
    assert!(live.iter().all(|(_, amount)| amount == 100.0));

    Ok(())
}

#[tokio::test]
async fn test_null_lifetime_counters_count_as_zero() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    warehouse
        .insert_fan(&FanRecord::new("quiet").with_unit(BusinessUnit::Mobile))
        .await?;
    warehouse
        .insert_fan(
            &FanRecord::new("loud")
                .with_unit(BusinessUnit::Mobile)
                .with_spend("mobile_order_amount_total", 10.0),
        )
        .await?;
    let service = service(warehouse);

    let revenue = service.revenue_by_year(Scope::Unit(BusinessUnit::Mobile)).await?;
    assert_eq!(revenue.get(2024), Some(5.0));
    assert_eq!(revenue.get(2025), Some(5.0));

    Ok(())
}

#[tokio::test]
async fn test_timestamps_at_year_boundaries() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    record(&warehouse, BusinessUnit::Events, "2024-12-31", 10.0).await?;
    record(&warehouse, BusinessUnit::Events, "2025-01-01", 20.0).await?;
    let service = service(warehouse);

    let revenue = service.revenue_by_year(Scope::Unit(BusinessUnit::Events)).await?;
    assert_eq!(revenue.get(2024), Some(10.0));
    assert_eq!(revenue.get(2025), Some(20.0));

    Ok(())
}

#[tokio::test]
async fn test_unknown_scope_name_is_rejected() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    let service = service(warehouse);

    let err = service.revenue_by_scope_name("Bogus").await.unwrap_err();
    assert!(matches!(err, AppError::UnrecognizedScope(ref name) if name == "Bogus"));

    let live = service.revenue_by_scope_name("Live").await?;
    assert_eq!(live.total(), 0.0);

    Ok(())
}

#[tokio::test]
async fn test_cached_reports_serve_stale_until_invalidated() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    StandardWarehouse::load(&warehouse).await?;
    let reports = CachedReports::new(service(warehouse), ReportCache::default());
    let scope = Scope::Unit(BusinessUnit::Sportsbook);

    assert_eq!(reports.revenue_report(scope).await?.total, 80.0);

    record(
        reports.service().source(),
        BusinessUnit::Sportsbook,
        "2024-02-02",
        20.0,
    )
    .await?;
    assert_eq!(reports.revenue_report(scope).await?.total, 80.0);

    reports.invalidate_all();
    assert_eq!(reports.revenue_report(scope).await?.total, 100.0);

    Ok(())
}

#[tokio::test]
async fn test_monthly_trends_from_ledger() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;
    let entries = [
        ("2023-02-28", None, 5.0),
        ("2025-01-05", Some("f1"), 10.0),
        ("2025-01-20", Some("f1"), 20.0),
        ("2025-01-21", Some("f2"), 5.0),
        ("2025-02-01", None, 7.0),
    ];
    for (date, fan, amount) in entries {
        let mut entry = LedgerEntry::new(parse_date(date), amount);
        if let Some(fan) = fan {
            entry = entry.with_fan(fan);
        }
        warehouse
            .insert_ledger_entry(BusinessUnit::Commerce, &entry)
            .await?;
    }
    let service = service(warehouse);

    let report = service
        .monthly_trends(BusinessUnit::Commerce, parse_date("2025-02-10").date_naive())
        .await?;

    // 24 months ending February 2025 start in March 2023.
    assert_eq!(report.since.to_string(), "2023-03-01");
    assert_eq!(
        report.months,
        vec![
            MonthlyTrend {
                month: "2025-01".into(),
                orders: 3,
                customers: 2,
                revenue: 35.0,
            },
            MonthlyTrend {
                month: "2025-02".into(),
                orders: 1,
                customers: 0,
                revenue: 7.0,
            },
        ]
    );

    Ok(())
}

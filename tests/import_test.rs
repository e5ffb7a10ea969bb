mod common;

use anyhow::Result;
use common::{service, test_warehouse};
use fanrev::io::{ImportOptions, Importer};
use fanrev::{BusinessUnit, FanRecord, LedgerEntry, Scope};

#[tokio::test]
async fn test_import_ledger_csv() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;

    let csv = "id,fan_id,timestamp,amount\n\
               o-1,f1,2024-05-01,\"$1,200.50\"\n\
               o-2,,2025-02-03T12:00:00Z,99.50\n\
               ,f2,2025-02-04,0.5\n\
               o-4,f1,yesterday,10\n\
               o-5,f1,2024-01-01,ten\n";

    let result = Importer::new(&warehouse)
        .import_ledger_csv(BusinessUnit::OnlineStore, csv.as_bytes(), ImportOptions::default())
        .await?;

    assert_eq!(result.imported, 3);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].line, 5);
    assert_eq!(result.errors[0].field.as_deref(), Some("timestamp"));
    assert_eq!(result.errors[1].line, 6);
    assert_eq!(result.errors[1].field.as_deref(), Some("amount"));

    let revenue = service(warehouse)
        .revenue_by_year(Scope::Unit(BusinessUnit::OnlineStore))
        .await?;
    assert_eq!(revenue.get(2024), Some(1200.5));
    assert_eq!(revenue.get(2025), Some(100.0));

    Ok(())
}

#[tokio::test]
async fn test_import_dry_run_writes_nothing() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;

    let csv = "id,fan_id,timestamp,amount\no-1,f1,2024-05-01,10\n";
    let result = Importer::new(&warehouse)
        .import_ledger_csv(
            BusinessUnit::Events,
            csv.as_bytes(),
            ImportOptions { dry_run: true },
        )
        .await?;
    assert_eq!(result.imported, 1);

    let revenue = service(warehouse)
        .revenue_by_year(Scope::Unit(BusinessUnit::Events))
        .await?;
    assert_eq!(revenue.total(), 0.0);

    Ok(())
}

#[tokio::test]
async fn test_ledger_import_rejects_lifetime_unit() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;

    let csv = "id,fan_id,timestamp,amount\no-1,f1,2024-05-01,10\n";
    let result = Importer::new(&warehouse)
        .import_ledger_csv(BusinessUnit::Live, csv.as_bytes(), ImportOptions::default())
        .await;
    assert!(result.is_err());

    let entry = LedgerEntry::new(common::parse_date("2024-05-01"), 10.0);
    assert!(
        warehouse
            .insert_ledger_entry(BusinessUnit::Marketplace, &entry)
            .await
            .is_err()
    );

    Ok(())
}

#[tokio::test]
async fn test_import_fans_json() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;

    let json = r#"[
        {"id": "f1", "units": ["live", "marketplace"], "leagues": ["NHL"],
         "nfl_teams": ["dallas cowboys", "Dallas  Cowboys"],
         "lifetime_spend": {"live_total_revenue": 50.0, "marketplace_revenue_lifetime": 30.0}},
        {"id": "f2", "state": "CA", "age_range": "25-34", "units": ["marketplace"]},
        {"id": "f1", "units": ["live"]}
    ]"#;

    let result = Importer::new(&warehouse)
        .import_fans_json(json.as_bytes(), ImportOptions::default())
        .await?;

    // The repeated id violates the primary key.
    assert_eq!(result.imported, 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].line, 3);

    let service = service(warehouse);
    assert_eq!(service.total_fans(Scope::AllUnits).await?, 2);
    assert_eq!(
        service.total_fans(Scope::Unit(BusinessUnit::Marketplace)).await?,
        2
    );

    let marketplace = service
        .revenue_by_year(Scope::Unit(BusinessUnit::Marketplace))
        .await?;
    assert_eq!(marketplace.get(2025), Some(15.0));

    let teams = service.top_nfl_teams(15).await?;
    assert_eq!(teams.teams.len(), 1);
    assert_eq!(teams.teams[0].value, "Dallas Cowboys");
    assert_eq!(teams.teams[0].fans, 1);

    Ok(())
}

#[tokio::test]
async fn test_unknown_spend_column_is_rejected() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;

    let fan = FanRecord::new("f1").with_spend("fans; DROP TABLE fans", 1.0);
    assert!(warehouse.insert_fan(&fan).await.is_err());

    let service = service(warehouse);
    assert_eq!(service.total_fans(Scope::AllUnits).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_negative_amounts_are_rejected() -> Result<()> {
    let (warehouse, _temp) = test_warehouse().await?;

    let csv = "id,fan_id,timestamp,amount\n\
               o-1,f1,2024-05-01,100\n\
               r-1,f1,2024-05-02,-150\n";
    let result = Importer::new(&warehouse)
        .import_ledger_csv(BusinessUnit::Commerce, csv.as_bytes(), ImportOptions::default())
        .await?;
    assert_eq!(result.imported, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].line, 3);
    assert_eq!(result.errors[0].field.as_deref(), Some("amount"));

    let refund = LedgerEntry::new(common::parse_date("2024-05-02"), -150.0);
    assert!(
        warehouse
            .insert_ledger_entry(BusinessUnit::Commerce, &refund)
            .await
            .is_err()
    );

    let fan = FanRecord::new("f1").with_spend("live_total_revenue", -1.0);
    assert!(warehouse.insert_fan(&fan).await.is_err());

    let service = service(warehouse);
    let revenue = service
        .revenue_by_year(Scope::Unit(BusinessUnit::Commerce))
        .await?;
    assert_eq!(revenue.get(2024), Some(100.0));
    assert_eq!(service.total_fans(Scope::AllUnits).await?, 0);

    Ok(())
}

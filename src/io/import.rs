use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::io::Read;
use tracing::info;

use crate::domain::{BusinessUnit, FanRecord, LedgerEntry, RevenueSourceKind, parse_amount};
use crate::storage::Warehouse;

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
}

/// Importer for loading source data into the warehouse
pub struct Importer<'a> {
    warehouse: &'a Warehouse,
}

impl<'a> Importer<'a> {
    pub fn new(warehouse: &'a Warehouse) -> Self {
        Self { warehouse }
    }

    /// Import ledger entries for a transaction-ledger unit from CSV.
    ///
    /// Expected header: `id,fan_id,timestamp,amount`. An empty id gets a
    /// generated one. Bad lines are reported and skipped.
    pub async fn import_ledger_csv<R: Read>(
        &self,
        unit: BusinessUnit,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        if unit.source_kind() != RevenueSourceKind::TransactionLedger {
            anyhow::bail!("{} has no transaction ledger; import its fans instead", unit);
        }

        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut result = ImportResult::default();

        for (line_num, record) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let id = record.get(0).unwrap_or("").trim();
            let fan_id = record.get(1).unwrap_or("").trim();
            let timestamp_str = record.get(2).unwrap_or("");
            let amount_str = record.get(3).unwrap_or("");

            let timestamp = match parse_timestamp(timestamp_str) {
                Ok(ts) => ts,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: Some("timestamp".to_string()),
                        error: format!("Invalid timestamp: {}", e),
                    });
                    continue;
                }
            };

            let amount = match parse_amount(amount_str) {
                Ok(a) if a < 0.0 => {
                    result.errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Negative amount {}: ledgers hold gross revenue", a),
                    });
                    continue;
                }
                Ok(a) => a,
                Err(e) => {
                    result.errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Invalid amount: {}", e),
                    });
                    continue;
                }
            };

            let mut entry = LedgerEntry::new(timestamp, amount);
            if !id.is_empty() {
                entry = entry.with_id(id);
            }
            if !fan_id.is_empty() {
                entry = entry.with_fan(fan_id);
            }

            if options.dry_run {
                result.imported += 1;
                continue;
            }

            match self.warehouse.insert_ledger_entry(unit, &entry).await {
                Ok(()) => result.imported += 1,
                Err(e) => result.errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("{:#}", e),
                }),
            }
        }

        info!(
            unit = unit.as_str(),
            imported = result.imported,
            errors = result.errors.len(),
            "ledger import finished"
        );
        Ok(result)
    }

    /// Import fan records from a JSON array.
    pub async fn import_fans_json<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let fans: Vec<FanRecord> = serde_json::from_reader(reader)?;
        let mut result = ImportResult::default();

        for (index, fan) in fans.iter().enumerate() {
            if options.dry_run {
                result.imported += 1;
                continue;
            }

            match self.warehouse.insert_fan(fan).await {
                Ok(()) => result.imported += 1,
                Err(e) => result.errors.push(ImportError {
                    line: index + 1,
                    field: Some("id".to_string()),
                    error: format!("{}: {:#}", fan.id, e),
                }),
            }
        }

        info!(
            imported = result.imported,
            errors = result.errors.len(),
            "fan import finished"
        );
        Ok(result)
    }
}

// Helper function to parse timestamp
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    // Try RFC3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try YYYY-MM-DD format
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    anyhow::bail!("Invalid timestamp format: {}", s)
}

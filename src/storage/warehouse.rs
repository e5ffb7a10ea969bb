use std::collections::BTreeSet;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use crate::application::AggregationSource;
use crate::domain::{
    AggregateRow, AggregationRequest, BusinessUnit, FAN_TABLE, FanRecord, GroupBy, League,
    LEDGER_FAN_COLUMN, LEDGER_ID_COLUMN, LedgerEntry, NFL_TEAM_COLUMN, NFL_TEAM_TABLE, RevenueSource, lifetime_counter_columns,
    title_case,
};

use super::{BindValue, MIGRATION_001_WAREHOUSE, build_aggregation_sql};

/// SQLite-backed warehouse holding the fan table and the transaction ledgers.
pub struct Warehouse {
    pool: SqlitePool,
}

impl Warehouse {
    /// Create a new warehouse with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_WAREHOUSE)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let warehouse = Self::connect(database_url).await?;
        warehouse.migrate().await?;
        Ok(warehouse)
    }

    /// Run one aggregation and decode its rows.
    pub async fn run_aggregation(&self, request: &AggregationRequest) -> Result<Vec<AggregateRow>> {
        let built = build_aggregation_sql(request);
        debug!(sql = %built.sql, binds = ?built.binds, "running aggregation");

        let mut query = sqlx::query(&built.sql);
        for value in &built.binds {
            query = match value {
                BindValue::Integer(v) => query.bind(*v),
                BindValue::Text(v) => query.bind(v.as_str()),
            };
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to aggregate {}", request))?;

        Ok(rows.iter().map(|row| Self::row_to_aggregate(row, request)).collect())
    }

    // Values that fail to decode become `None` and are dealt with by the
    // reconciliation step.
    fn row_to_aggregate(row: &sqlx::sqlite::SqliteRow, request: &AggregationRequest) -> AggregateRow {
        let mut aggregate = AggregateRow::new(None, None);
        match request.group_by {
            GroupBy::Nothing => {}
            GroupBy::YearOf(_) => {
                aggregate.key = row
                    .try_get::<Option<i64>, _>("group_key")
                    .unwrap_or_else(|e| {
                        warn!(source = %request, error = %e, "undecodable group key");
                        None
                    });
            }
            GroupBy::MonthOf(_) | GroupBy::Value(_) => {
                aggregate.label = row
                    .try_get::<Option<String>, _>("group_key")
                    .unwrap_or_else(|e| {
                        warn!(source = %request, error = %e, "undecodable group label");
                        None
                    });
            }
        }
        aggregate.total = row
            .try_get::<Option<f64>, _>("total")
            .unwrap_or_else(|e| {
                warn!(source = %request, error = %e, "undecodable total");
                None
            });
        aggregate
    }

    // ========================
    // Loading
    // ========================

    /// Record a transaction in a ledger-backed unit's source table.
    pub async fn insert_ledger_entry(&self, unit: BusinessUnit, entry: &LedgerEntry) -> Result<()> {
        let RevenueSource::TransactionLedger {
            table,
            timestamp_column,
            amount_column,
        } = unit.descriptor().revenue
        else {
            bail!("{} has no transaction ledger", unit);
        };
        if !entry.amount.is_finite() || entry.amount < 0.0 {
            bail!(
                "Invalid amount {} for {} entry {}: ledgers hold gross revenue",
                entry.amount,
                unit,
                entry.id
            );
        }

        let sql = format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, ?)",
            table, LEDGER_ID_COLUMN, LEDGER_FAN_COLUMN, timestamp_column, amount_column
        );

        sqlx::query(&sql)
            .bind(&entry.id)
            .bind(&entry.fan_id)
            .bind(entry.occurred_at.to_rfc3339_opts(SecondsFormat::Secs, true))
            .bind(entry.amount)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to save {} entry {}", unit, entry.id))?;
        Ok(())
    }

    /// Save a fan record and its favourite teams. Lifetime spend keys must be
    /// known counter columns holding non-negative amounts.
    pub async fn insert_fan(&self, fan: &FanRecord) -> Result<()> {
        let known: Vec<&'static str> = lifetime_counter_columns().collect();
        let mut spend_columns = Vec::with_capacity(fan.lifetime_spend.len());
        for (column, amount) in &fan.lifetime_spend {
            let Some(known_column) = known.iter().find(|k| **k == column.as_str()) else {
                bail!("Unknown lifetime spend column: {}", column);
            };
            if !amount.is_finite() || *amount < 0.0 {
                bail!("Invalid lifetime spend {} for {}", amount, column);
            }
            spend_columns.push((*known_column, *amount));
        }

        let mut columns: Vec<&str> = vec!["id", "state", "age_range"];
        columns.extend(BusinessUnit::ALL.iter().map(|u| u.descriptor().membership_column));
        columns.extend(League::ALL.iter().map(|l| l.preference_column()));
        columns.extend(spend_columns.iter().map(|(c, _)| *c));

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            FAN_TABLE,
            columns.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql)
            .bind(&fan.id)
            .bind(&fan.state)
            .bind(&fan.age_range);
        for unit in BusinessUnit::ALL {
            query = query.bind(fan.belongs_to(unit));
        }
        for league in League::ALL {
            query = query.bind(fan.prefers(league));
        }
        for (_, amount) in &spend_columns {
            query = query.bind(*amount);
        }

        let teams: BTreeSet<String> = fan
            .nfl_teams
            .iter()
            .map(|t| title_case(t))
            .filter(|t| !t.is_empty())
            .collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        query
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save fan {}", fan.id))?;

        let team_sql = format!(
            "INSERT INTO {} (fan_id, {}) VALUES (?, ?)",
            NFL_TEAM_TABLE, NFL_TEAM_COLUMN
        );
        for team in &teams {
            sqlx::query(&team_sql)
                .bind(&fan.id)
                .bind(team)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to save team {} for fan {}", team, fan.id))?;
        }

        tx.commit()
            .await
            .with_context(|| format!("Failed to save fan {}", fan.id))?;
        Ok(())
    }
}

#[async_trait]
impl AggregationSource for Warehouse {
    async fn aggregate(&self, request: &AggregationRequest) -> Result<Vec<AggregateRow>> {
        self.run_aggregation(request).await
    }
}

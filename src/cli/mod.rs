use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::application::{
    AppError, CachedReports, ReportCache, RevenueService, TOP_NFL_TEAMS, TOP_STATES, ValueFanCount,
};
use crate::domain::{
    BusinessUnit, ReportingYears, RevenueSource, Scope, format_amount, format_compact,
};
use crate::storage::Warehouse;

/// fanrev - Fan engagement revenue reports
#[derive(Parser)]
#[command(name = "fanrev")]
#[command(about = "Revenue and audience reports across business units of a fan-engagement warehouse")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "FANREV_DATABASE", default_value = "fanrev.db")]
    pub database: String,

    /// Reporting years, comma separated
    #[arg(long, env = "FANREV_YEARS", default_value = "2024,2025", global = true)]
    pub years: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new warehouse database
    Init,

    /// List business units and where their revenue comes from
    Units,

    /// Load source data
    #[command(subcommand)]
    Import(ImportCommands),

    /// Generate reports
    #[command(subcommand)]
    Report(ReportCommands),
}

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Import transactions for a ledger-backed unit from CSV (id,fan_id,timestamp,amount)
    Ledger {
        /// Business unit (e.g. commerce, sportsbook, events, online_store)
        #[arg(short, long)]
        unit: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },

    /// Import fan records from a JSON array
    Fans {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Gross revenue per reporting year
    Revenue {
        /// "all" or a business unit name
        #[arg(short, long, default_value = "all")]
        scope: String,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Fan counts per business unit
    Fans {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// League preferences of fans in scope
    Leagues {
        /// "all" or a business unit name
        #[arg(short, long, default_value = "all")]
        scope: String,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Fans per age range within a scope
    Ages {
        /// "all" or a business unit name
        #[arg(short, long, default_value = "all")]
        scope: String,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// States with the most fans
    States {
        /// Number of states to show
        #[arg(short, long, default_value_t = TOP_STATES)]
        limit: u32,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Favourite NFL teams
    Teams {
        /// Number of teams to show
        #[arg(short, long, default_value_t = TOP_NFL_TEAMS)]
        limit: u32,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Monthly orders, customers and revenue of a ledger-backed unit
    Trends {
        /// Business unit (e.g. commerce, sportsbook, events, online_store)
        #[arg(short, long, default_value = "commerce")]
        unit: String,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// KPI summary for a scope
    Summary {
        /// "all" or a business unit name
        #[arg(short, long, default_value = "all")]
        scope: String,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let years = ReportingYears::parse(&self.years).map_err(AppError::from)?;

        match self.command {
            Commands::Init => {
                Warehouse::init(&database_url(&self.database, true)).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Units => run_units_command(),

            Commands::Import(import_cmd) => {
                let warehouse = Warehouse::connect(&database_url(&self.database, false)).await?;
                run_import_command(&warehouse, import_cmd).await?;
            }

            Commands::Report(report_cmd) => {
                let warehouse = Warehouse::connect(&database_url(&self.database, false)).await?;
                let reports = CachedReports::new(
                    RevenueService::new(warehouse, years),
                    ReportCache::default(),
                );
                run_report_command(&reports, report_cmd).await?;
            }
        }

        Ok(())
    }
}

fn database_url(path: &str, create: bool) -> String {
    if create {
        format!("sqlite:{}?mode=rwc", path)
    } else {
        format!("sqlite:{}", path)
    }
}

fn parse_scope(name: &str) -> Result<Scope> {
    Ok(RevenueService::<Warehouse>::parse_scope(name)?)
}

fn run_units_command() {
    println!("{:<22} {:<20} {:<22} {}", "UNIT", "SOURCE", "TABLE", "AMOUNT");
    println!("{}", "-".repeat(90));
    for unit in BusinessUnit::ALL {
        let (kind, table, amount) = match unit.descriptor().revenue {
            RevenueSource::TransactionLedger {
                table,
                amount_column,
                ..
            } => ("transaction ledger", table, amount_column.to_string()),
            RevenueSource::LifetimeAggregate { counter_columns } => {
                ("lifetime aggregate", "fans", counter_columns.join(" + "))
            }
        };
        println!("{:<22} {:<20} {:<22} {}", unit.as_str(), kind, table, amount);
    }
}

async fn run_import_command(warehouse: &Warehouse, cmd: ImportCommands) -> Result<()> {
    use crate::io::{ImportOptions, Importer};

    let importer = Importer::new(warehouse);

    let (result, dry_run) = match cmd {
        ImportCommands::Ledger {
            unit,
            input,
            dry_run,
        } => {
            let unit = parse_unit(&unit)?;
            let reader = open_input(input.as_deref())?;
            let result = importer
                .import_ledger_csv(unit, reader, ImportOptions { dry_run })
                .await?;
            (result, dry_run)
        }
        ImportCommands::Fans { input, dry_run } => {
            let reader = open_input(input.as_deref())?;
            let result = importer
                .import_fans_json(reader, ImportOptions { dry_run })
                .await?;
            (result, dry_run)
        }
    };

    // Display results
    if dry_run {
        println!("Validation finished");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Line {}: {}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!("{}: ", f))
                    .unwrap_or_default()
                    + &error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

fn parse_unit(name: &str) -> Result<BusinessUnit> {
    Ok(BusinessUnit::from_str(name)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown business unit: {}", name)))?)
}

fn print_value_counts(title: &str, label: &str, counts: &[ValueFanCount]) {
    println!("{}", title);
    println!();
    println!("{:<24} {:>12}", label, "FANS");
    println!("{}", "-".repeat(37));
    for count in counts {
        println!("{:<24} {:>12}", count.value, format_compact(count.fans as f64));
    }
    if counts.is_empty() {
        println!("(no data)");
    }
}

fn open_input(input: Option<&str>) -> Result<Box<dyn std::io::Read>> {
    use std::fs::File;
    use std::io::{Read, stdin};

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };
    Ok(reader)
}

async fn run_report_command(reports: &CachedReports<Warehouse>, cmd: ReportCommands) -> Result<()> {
    use crate::io::Exporter;
    use std::io::stdout;

    match cmd {
        ReportCommands::Revenue { scope, format } => {
            let scope = parse_scope(&scope)?;
            let report = reports.revenue_report(scope).await?;
            info!(scope = scope.as_str(), total = report.total, "revenue report");

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    Exporter::new(stdout()).revenue_csv(&report)?;
                }
                _ => {
                    // Table format
                    println!("Gross Revenue: {}", report.scope);
                    println!();
                    println!("{:<8} {:>18}", "YEAR", "REVENUE");
                    println!("{}", "-".repeat(27));
                    for (year, amount) in report.by_year.iter() {
                        println!("{:<8} {:>18}", year, format_amount(amount));
                    }
                    println!("{}", "-".repeat(27));
                    println!("{:<8} {:>18}", "TOTAL", format_amount(report.total));
                }
            }
        }

        ReportCommands::Fans { format } => {
            let report = reports.unit_breakdown().await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    Exporter::new(stdout()).unit_breakdown_csv(&report)?;
                }
                _ => {
                    println!("Fans by Business Unit");
                    println!();
                    println!("{:<22} {:>12} {:>8}", "UNIT", "FANS", "PERCENT");
                    println!("{}", "-".repeat(44));
                    for unit in &report.units {
                        println!(
                            "{:<22} {:>12} {:>7.1}%",
                            unit.unit.display_name(),
                            format_compact(unit.fans as f64),
                            unit.percentage
                        );
                    }
                    println!("{}", "-".repeat(44));
                    println!(
                        "{:<22} {:>12}",
                        "TOTAL FANS",
                        format_compact(report.total_fans as f64)
                    );
                }
            }
        }

        ReportCommands::Leagues { scope, format } => {
            let scope = parse_scope(&scope)?;
            let report = reports.league_preferences(scope).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    Exporter::new(stdout()).leagues_csv(&report)?;
                }
                _ => {
                    println!("League Preferences: {}", report.scope);
                    println!();
                    println!("{:<8} {:>12}", "LEAGUE", "FANS");
                    println!("{}", "-".repeat(21));
                    for league in &report.leagues {
                        println!(
                            "{:<8} {:>12}",
                            league.league.as_str(),
                            format_compact(league.fans as f64)
                        );
                    }
                }
            }
        }

        ReportCommands::Ages { scope, format } => {
            let scope = parse_scope(&scope)?;
            let report = reports.age_demographics(scope).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    Exporter::new(stdout()).value_counts_csv("age_range", &report.age_ranges)?;
                }
                _ => print_value_counts(
                    &format!("Age Ranges: {}", report.scope),
                    "AGE RANGE",
                    &report.age_ranges,
                ),
            }
        }

        ReportCommands::States { limit, format } => {
            let report = reports.top_states(limit).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    Exporter::new(stdout()).value_counts_csv("state", &report.states)?;
                }
                _ => print_value_counts("Top States", "STATE", &report.states),
            }
        }

        ReportCommands::Teams { limit, format } => {
            let report = reports.top_nfl_teams(limit).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    Exporter::new(stdout()).value_counts_csv("nfl_team", &report.teams)?;
                }
                _ => print_value_counts("Top NFL Teams", "TEAM", &report.teams),
            }
        }

        ReportCommands::Trends { unit, format } => {
            let unit = parse_unit(&unit)?;
            let report = reports
                .monthly_trends(unit, chrono::Utc::now().date_naive())
                .await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                "csv" => {
                    Exporter::new(stdout()).trends_csv(&report)?;
                }
                _ => {
                    println!("Monthly Trends: {} (since {})", report.unit, report.since);
                    println!();
                    println!(
                        "{:<8} {:>10} {:>10} {:>18}",
                        "MONTH", "ORDERS", "CUSTOMERS", "REVENUE"
                    );
                    println!("{}", "-".repeat(49));
                    for month in &report.months {
                        println!(
                            "{:<8} {:>10} {:>10} {:>18}",
                            month.month,
                            month.orders,
                            month.customers,
                            format_amount(month.revenue)
                        );
                    }
                }
            }
        }

        ReportCommands::Summary { scope, format } => {
            let scope = parse_scope(&scope)?;
            let summary = reports.scope_summary(scope).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
                "csv" => {
                    Exporter::new(stdout()).summary_csv(&summary)?;
                }
                _ => {
                    println!("Summary: {}", summary.scope);
                    println!();
                    println!("Fans:              {:>12}", format_compact(summary.fans as f64));
                    println!("Share of all fans: {:>11.1}%", summary.share_of_all_fans);
                    println!(
                        "Top league:        {:>12}",
                        summary.top_league.map(|l| l.as_str()).unwrap_or("-")
                    );
                    for (year, amount) in summary.revenue.by_year.iter().rev() {
                        println!("{} revenue:      {:>12}", year, format_compact(amount));
                    }
                    if !summary.age_ranges.is_empty() {
                        println!();
                        println!("Age ranges:");
                        for range in &summary.age_ranges {
                            println!(
                                "  {:<16} {:>12}",
                                range.value,
                                format_compact(range.fans as f64)
                            );
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

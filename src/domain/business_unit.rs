use serde::{Deserialize, Serialize};

/// Table holding one row per fan, with membership flags, league preferences
/// and the lifetime spend counters.
pub const FAN_TABLE: &str = "fans";

/// Columns every transaction ledger table carries besides its timestamp and
/// amount.
pub const LEDGER_ID_COLUMN: &str = "id";
pub const LEDGER_FAN_COLUMN: &str = "fan_id";

/// A consumer-facing business unit tracked as a fan-engagement dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessUnit {
    Commerce,
    Sportsbook,
    Events,
    OnlineStore,
    Live,
    Mobile,
    DigitalCollectibles,
    Marketplace,
}

/// How a unit's revenue is recorded upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueSourceKind {
    /// One row per transaction, with a timestamp and an amount.
    TransactionLedger,
    /// One cumulative counter per fan, without any timestamp.
    LifetimeAggregate,
}

/// Where a unit's revenue lives in the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevenueSource {
    TransactionLedger {
        table: &'static str,
        timestamp_column: &'static str,
        amount_column: &'static str,
    },
    /// Counter columns on [`FAN_TABLE`]; a fan's lifetime spend is their sum.
    LifetimeAggregate {
        counter_columns: &'static [&'static str],
    },
}

impl RevenueSource {
    pub fn kind(&self) -> RevenueSourceKind {
        match self {
            RevenueSource::TransactionLedger { .. } => RevenueSourceKind::TransactionLedger,
            RevenueSource::LifetimeAggregate { .. } => RevenueSourceKind::LifetimeAggregate,
        }
    }
}

/// Declarative description of one unit's data in the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub unit: BusinessUnit,
    /// Boolean column on [`FAN_TABLE`] flagging fans that belong to the unit.
    pub membership_column: &'static str,
    pub revenue: RevenueSource,
}

static SOURCES: [SourceDescriptor; 8] = [
    SourceDescriptor {
        unit: BusinessUnit::Commerce,
        membership_column: "commerce_fan",
        revenue: RevenueSource::TransactionLedger {
            table: "commerce_purchases",
            timestamp_column: "ordered_at",
            amount_column: "gross_demand",
        },
    },
    SourceDescriptor {
        unit: BusinessUnit::Sportsbook,
        membership_column: "sportsbook_fan",
        revenue: RevenueSource::TransactionLedger {
            table: "sportsbook_wagers",
            timestamp_column: "placed_at",
            amount_column: "total_stake",
        },
    },
    SourceDescriptor {
        unit: BusinessUnit::Events,
        membership_column: "events_fan",
        revenue: RevenueSource::TransactionLedger {
            table: "event_orders",
            timestamp_column: "completed_at",
            amount_column: "total_paid",
        },
    },
    SourceDescriptor {
        unit: BusinessUnit::OnlineStore,
        membership_column: "online_store_fan",
        revenue: RevenueSource::TransactionLedger {
            table: "online_store_orders",
            timestamp_column: "ordered_at",
            amount_column: "gmv_usd",
        },
    },
    SourceDescriptor {
        unit: BusinessUnit::Live,
        membership_column: "live_fan",
        revenue: RevenueSource::LifetimeAggregate {
            counter_columns: &["live_total_revenue"],
        },
    },
    SourceDescriptor {
        unit: BusinessUnit::Mobile,
        membership_column: "mobile_fan",
        revenue: RevenueSource::LifetimeAggregate {
            counter_columns: &["mobile_order_amount_total"],
        },
    },
    SourceDescriptor {
        unit: BusinessUnit::DigitalCollectibles,
        membership_column: "digital_collectibles_fan",
        revenue: RevenueSource::LifetimeAggregate {
            counter_columns: &[
                "digital_baseball_spend_lifetime",
                "digital_disney_spend_lifetime",
                "digital_marvel_spend_lifetime",
                "digital_starwars_spend_lifetime",
                "digital_wwe_spend_lifetime",
            ],
        },
    },
    SourceDescriptor {
        unit: BusinessUnit::Marketplace,
        membership_column: "marketplace_fan",
        revenue: RevenueSource::LifetimeAggregate {
            counter_columns: &["marketplace_revenue_lifetime"],
        },
    },
];

impl BusinessUnit {
    pub const ALL: [BusinessUnit; 8] = [
        BusinessUnit::Commerce,
        BusinessUnit::Sportsbook,
        BusinessUnit::Events,
        BusinessUnit::OnlineStore,
        BusinessUnit::Live,
        BusinessUnit::Mobile,
        BusinessUnit::DigitalCollectibles,
        BusinessUnit::Marketplace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessUnit::Commerce => "commerce",
            BusinessUnit::Sportsbook => "sportsbook",
            BusinessUnit::Events => "events",
            BusinessUnit::OnlineStore => "online_store",
            BusinessUnit::Live => "live",
            BusinessUnit::Mobile => "mobile",
            BusinessUnit::DigitalCollectibles => "digital_collectibles",
            BusinessUnit::Marketplace => "marketplace",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BusinessUnit::Commerce => "Commerce",
            BusinessUnit::Sportsbook => "Sportsbook",
            BusinessUnit::Events => "Events",
            BusinessUnit::OnlineStore => "Online Store",
            BusinessUnit::Live => "Live",
            BusinessUnit::Mobile => "Mobile",
            BusinessUnit::DigitalCollectibles => "Digital Collectibles",
            BusinessUnit::Marketplace => "Marketplace",
        }
    }

    /// Parse a unit from its canonical name or one of the dashboard labels.
    /// Matching ignores case, spaces, dashes, underscores and dots.
    pub fn from_str(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_' | '.'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "commerce" => Some(BusinessUnit::Commerce),
            "sportsbook" | "fbg" | "fbg(sportsbook)" => Some(BusinessUnit::Sportsbook),
            "events" => Some(BusinessUnit::Events),
            "onlinestore" | "toppscom" => Some(BusinessUnit::OnlineStore),
            "live" => Some(BusinessUnit::Live),
            "mobile" | "fanapp" => Some(BusinessUnit::Mobile),
            "digitalcollectibles" | "toppsdigital" => Some(BusinessUnit::DigitalCollectibles),
            "marketplace" | "collect" => Some(BusinessUnit::Marketplace),
            _ => None,
        }
    }

    pub fn descriptor(&self) -> &'static SourceDescriptor {
        let index = match self {
            BusinessUnit::Commerce => 0,
            BusinessUnit::Sportsbook => 1,
            BusinessUnit::Events => 2,
            BusinessUnit::OnlineStore => 3,
            BusinessUnit::Live => 4,
            BusinessUnit::Mobile => 5,
            BusinessUnit::DigitalCollectibles => 6,
            BusinessUnit::Marketplace => 7,
        };
        &SOURCES[index]
    }

    pub fn source_kind(&self) -> RevenueSourceKind {
        self.descriptor().revenue.kind()
    }
}

impl std::fmt::Display for BusinessUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Every lifetime counter column known to the fan table.
pub fn lifetime_counter_columns() -> impl Iterator<Item = &'static str> {
    SOURCES
        .iter()
        .filter_map(|d| match d.revenue {
            RevenueSource::LifetimeAggregate { counter_columns } => Some(counter_columns),
            RevenueSource::TransactionLedger { .. } => None,
        })
        .flatten()
        .copied()
}

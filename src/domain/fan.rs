use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, BusinessUnit};

/// Text columns on the fan table used for demographic breakdowns.
pub const AGE_RANGE_COLUMN: &str = "age_range";
pub const STATE_COLUMN: &str = "state";

/// One row per (fan, favourite NFL team).
pub const NFL_TEAM_TABLE: &str = "fan_nfl_teams";
pub const NFL_TEAM_COLUMN: &str = "team";

/// League preference flags recorded per fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum League {
    Nfl,
    Mlb,
    Nba,
    Ncaa,
    Nhl,
}

impl League {
    pub const ALL: [League; 5] = [
        League::Nfl,
        League::Mlb,
        League::Nba,
        League::Ncaa,
        League::Nhl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            League::Nfl => "NFL",
            League::Mlb => "MLB",
            League::Nba => "NBA",
            League::Ncaa => "NCAA",
            League::Nhl => "NHL",
        }
    }

    /// Boolean preference column on the fan table.
    pub fn preference_column(&self) -> &'static str {
        match self {
            League::Nfl => "prefers_nfl",
            League::Mlb => "prefers_mlb",
            League::Nba => "prefers_nba",
            League::Ncaa => "prefers_ncaa",
            League::Nhl => "prefers_nhl",
        }
    }
}

impl std::fmt::Display for League {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the fan table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanRecord {
    pub id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub units: Vec<BusinessUnit>,
    #[serde(default)]
    pub leagues: Vec<League>,
    /// Favourite NFL teams, free text.
    #[serde(default)]
    pub nfl_teams: Vec<String>,
    /// Lifetime spend keyed by counter column name.
    #[serde(default)]
    pub lifetime_spend: BTreeMap<String, Amount>,
}

impl FanRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: None,
            age_range: None,
            units: Vec::new(),
            leagues: Vec::new(),
            nfl_teams: Vec::new(),
            lifetime_spend: BTreeMap::new(),
        }
    }

    pub fn with_unit(mut self, unit: BusinessUnit) -> Self {
        if !self.units.contains(&unit) {
            self.units.push(unit);
        }
        self
    }

    pub fn with_league(mut self, league: League) -> Self {
        if !self.leagues.contains(&league) {
            self.leagues.push(league);
        }
        self
    }

    pub fn with_nfl_team(mut self, team: impl Into<String>) -> Self {
        self.nfl_teams.push(team.into());
        self
    }

    pub fn with_spend(mut self, column: impl Into<String>, amount: Amount) -> Self {
        self.lifetime_spend.insert(column.into(), amount);
        self
    }

    pub fn with_age_range(mut self, age_range: impl Into<String>) -> Self {
        self.age_range = Some(age_range.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn belongs_to(&self, unit: BusinessUnit) -> bool {
        self.units.contains(&unit)
    }

    pub fn prefers(&self, league: League) -> bool {
        self.leagues.contains(&league)
    }
}

/// Capitalize the first letter of every word and lowercase the rest, with
/// runs of whitespace collapsed: `"  new york  GIANTS"` -> `"New York Giants"`.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One transaction in a ledger-backed unit's source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub fan_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub amount: Amount,
}

impl LedgerEntry {
    pub fn new(occurred_at: DateTime<Utc>, amount: Amount) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fan_id: None,
            occurred_at,
            amount,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_fan(mut self, fan_id: impl Into<String>) -> Self {
        self.fan_id = Some(fan_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_builder_deduplicates() {
        let fan = FanRecord::new("f1")
            .with_unit(BusinessUnit::Live)
            .with_unit(BusinessUnit::Live)
            .with_league(League::Nfl)
            .with_league(League::Nfl)
            .with_spend("live_total_revenue", 42.0);

        assert_eq!(fan.units, vec![BusinessUnit::Live]);
        assert_eq!(fan.leagues, vec![League::Nfl]);
        assert!(fan.belongs_to(BusinessUnit::Live));
        assert!(!fan.belongs_to(BusinessUnit::Commerce));
        assert!(fan.prefers(League::Nfl));
        assert_eq!(fan.lifetime_spend.get("live_total_revenue"), Some(&42.0));
    }

    #[test]
    fn test_fan_record_from_minimal_json() {
        let fan: FanRecord =
            serde_json::from_str(r#"{"id":"f9","units":["live"],"leagues":["NBA"]}"#).unwrap();
        assert_eq!(fan.id, "f9");
        assert_eq!(fan.units, vec![BusinessUnit::Live]);
        assert_eq!(fan.leagues, vec![League::Nba]);
        assert!(fan.lifetime_spend.is_empty());
        assert_eq!(fan.state, None);
    }

    #[test]
    fn test_title_case_team_names() {
        assert_eq!(title_case("  new york  GIANTS"), "New York Giants");
        assert_eq!(title_case("san francisco 49ers"), "San Francisco 49ers");
        assert_eq!(title_case("   "), "");
    }

    #[test]
    fn test_ledger_entry_gets_generated_id() {
        let a = LedgerEntry::new(Utc::now(), 1.0);
        let b = LedgerEntry::new(Utc::now(), 1.0);
        assert_ne!(a.id, b.id);
        assert_eq!(a.with_id("order-1").id, "order-1");
    }
}

use serde::{Deserialize, Serialize};

use super::BusinessUnit;

/// Unit of analysis for a report: every business unit combined, or one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    AllUnits,
    Unit(BusinessUnit),
}

impl Scope {
    pub fn from_str(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Some(Scope::AllUnits);
        }
        BusinessUnit::from_str(s).map(Scope::Unit)
    }

    /// Units whose sources feed this scope.
    pub fn units(&self) -> Vec<BusinessUnit> {
        match self {
            Scope::AllUnits => BusinessUnit::ALL.to_vec(),
            Scope::Unit(unit) => vec![*unit],
        }
    }

    pub fn unit(&self) -> Option<BusinessUnit> {
        match self {
            Scope::AllUnits => None,
            Scope::Unit(unit) => Some(*unit),
        }
    }

    /// Stable identifier, used as a cache key argument.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::AllUnits => "all",
            Scope::Unit(unit) => unit.as_str(),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::AllUnits => write!(f, "All Units"),
            Scope::Unit(unit) => write!(f, "{}", unit),
        }
    }
}

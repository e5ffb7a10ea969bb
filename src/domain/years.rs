use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Amount;

pub type Year = i32;

/// The closed set of calendar years a report covers.
/// Always non-empty, sorted and free of duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReportingYears(Vec<Year>);

impl ReportingYears {
    pub fn new(years: impl IntoIterator<Item = Year>) -> Result<Self, InvalidYears> {
        let mut years: Vec<Year> = years.into_iter().collect();
        years.sort_unstable();
        years.dedup();

        if years.is_empty() {
            return Err(InvalidYears::Empty);
        }
        if let Some(&bad) = years.iter().find(|y| !(1900..=9999).contains(*y)) {
            return Err(InvalidYears::OutOfRange(bad));
        }

        Ok(Self(years))
    }

    /// Parse a comma-separated list such as "2024,2025".
    pub fn parse(input: &str) -> Result<Self, InvalidYears> {
        let years = input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<Year>()
                    .map_err(|_| InvalidYears::NotAYear(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(years)
    }

    pub fn as_slice(&self) -> &[Year] {
        &self.0
    }

    /// Number of years; never zero.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, year: Year) -> bool {
        self.0.binary_search(&year).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Year> + '_ {
        self.0.iter().copied()
    }
}

impl Default for ReportingYears {
    fn default() -> Self {
        Self(vec![2024, 2025])
    }
}

impl fmt::Display for ReportingYears {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|y| y.to_string()).collect();
        write!(f, "{}", joined.join(","))
    }
}

impl<'de> Deserialize<'de> for ReportingYears {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let years = Vec::<Year>::deserialize(deserializer)?;
        ReportingYears::new(years).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidYears {
    Empty,
    NotAYear(String),
    OutOfRange(Year),
}

impl fmt::Display for InvalidYears {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidYears::Empty => write!(f, "at least one reporting year is required"),
            InvalidYears::NotAYear(s) => write!(f, "'{}' is not a year", s),
            InvalidYears::OutOfRange(y) => write!(f, "year {} is out of range", y),
        }
    }
}

impl std::error::Error for InvalidYears {}

/// Revenue per supported year. Every year of the [`ReportingYears`] it was
/// created for is present; years without data hold `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct YearlyRevenue(BTreeMap<Year, Amount>);

impl YearlyRevenue {
    pub fn zeroed(years: &ReportingYears) -> Self {
        Self(years.iter().map(|y| (y, 0.0)).collect())
    }

    /// Add `amount` to `year`. Years outside the reporting set are ignored
    /// and `false` is returned.
    pub fn add(&mut self, year: Year, amount: Amount) -> bool {
        match self.0.get_mut(&year) {
            Some(total) => {
                *total += amount;
                true
            }
            None => false,
        }
    }

    /// Add every year of `other` into `self`.
    pub fn merge(&mut self, other: &YearlyRevenue) {
        for (&year, &amount) in &other.0 {
            self.add(year, amount);
        }
    }

    pub fn get(&self, year: Year) -> Option<Amount> {
        self.0.get(&year).copied()
    }

    pub fn total(&self) -> Amount {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Year, Amount)> + '_ {
        self.0.iter().map(|(&y, &a)| (y, a))
    }

    pub fn years(&self) -> impl Iterator<Item = Year> + '_ {
        self.0.keys().copied()
    }

    /// True when the keys are exactly `years`.
    pub fn covers(&self, years: &ReportingYears) -> bool {
        self.years().eq(years.iter())
    }
}

// Deserialized values must still look like something `zeroed` + `add` could
// have produced: valid years, at least one, finite non-negative amounts.
impl<'de> Deserialize<'de> for YearlyRevenue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let by_year = BTreeMap::<Year, Amount>::deserialize(deserializer)?;
        ReportingYears::new(by_year.keys().copied()).map_err(serde::de::Error::custom)?;
        if let Some((year, amount)) = by_year.iter().find(|(_, a)| !a.is_finite() || **a < 0.0) {
            return Err(serde::de::Error::custom(format!(
                "revenue {} for {} is not a valid amount",
                amount, year
            )));
        }
        Ok(Self(by_year))
    }
}

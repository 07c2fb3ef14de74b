// 💰 Income Entity - recurring income source
//
// No substructure: pay dates are derived from start date + frequency.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{days_in_month, month_bounds};

// ============================================================================
// INCOME FREQUENCY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeFrequency {
    /// Single payment on the start date
    Once,
    Weekly,
    Fortnightly,
    Monthly,
    Yearly,
}

impl IncomeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeFrequency::Once => "once",
            IncomeFrequency::Weekly => "weekly",
            IncomeFrequency::Fortnightly => "fortnightly",
            IncomeFrequency::Monthly => "monthly",
            IncomeFrequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for IncomeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncomeFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "once" => Ok(IncomeFrequency::Once),
            "weekly" => Ok(IncomeFrequency::Weekly),
            "fortnightly" | "biweekly" => Ok(IncomeFrequency::Fortnightly),
            "monthly" => Ok(IncomeFrequency::Monthly),
            "yearly" | "annually" => Ok(IncomeFrequency::Yearly),
            other => Err(format!("unknown income frequency: {}", other)),
        }
    }
}

// ============================================================================
// INCOME ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    /// Amount received per occurrence
    pub amount: f64,

    pub frequency: IncomeFrequency,

    /// First pay date
    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Income {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        frequency: IncomeFrequency,
        start_date: NaiveDate,
    ) -> Self {
        Income {
            id: None,
            name: name.into(),
            amount,
            frequency,
            start_date,
            end_date: None,
            notes: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Shallow merge, same rules as `Bill::merge`
    pub fn merge(&mut self, patch: Income) {
        self.name = patch.name;
        self.amount = patch.amount;
        self.frequency = patch.frequency;
        self.start_date = patch.start_date;
        if patch.end_date.is_some() {
            self.end_date = patch.end_date;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
    }

    fn active_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.map_or(true, |end| date <= end)
    }

    /// Pay dates of this income falling in the given calendar month
    pub fn occurrences_in(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        let Some((first, last)) = month_bounds(year, month) else {
            return Vec::new();
        };

        let candidates = match self.frequency {
            IncomeFrequency::Once => vec![self.start_date],
            IncomeFrequency::Weekly => self.stepped(first, last, 7),
            IncomeFrequency::Fortnightly => self.stepped(first, last, 14),
            IncomeFrequency::Monthly => {
                let day = self.start_date.day().min(days_in_month(year, month));
                NaiveDate::from_ymd_opt(year, month, day).into_iter().collect()
            }
            IncomeFrequency::Yearly if self.start_date.month() == month => {
                let day = self.start_date.day().min(days_in_month(year, month));
                NaiveDate::from_ymd_opt(year, month, day).into_iter().collect()
            }
            IncomeFrequency::Yearly => Vec::new(),
        };

        candidates
            .into_iter()
            .filter(|d| *d >= first && *d <= last && self.active_on(*d))
            .collect()
    }

    /// Total received in the given calendar month
    pub fn amount_in(&self, year: i32, month: u32) -> f64 {
        self.occurrences_in(year, month).len() as f64 * self.amount
    }

    fn stepped(&self, first: NaiveDate, last: NaiveDate, step_days: i64) -> Vec<NaiveDate> {
        let mut date = self.start_date;
        if date < first {
            let behind = (first - date).num_days();
            let steps = (behind + step_days - 1) / step_days;
            date += Duration::days(steps * step_days);
        }

        let mut dates = Vec::new();
        while date <= last {
            dates.push(date);
            date += Duration::days(step_days);
        }
        dates
    }
}

// ============================================================================
// NEW INCOME (creation payload)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncome {
    pub name: String,
    pub amount: f64,
    pub frequency: IncomeFrequency,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewIncome {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        frequency: IncomeFrequency,
        start_date: NaiveDate,
    ) -> Self {
        NewIncome {
            name: name.into(),
            amount,
            frequency,
            start_date,
            end_date: None,
            notes: None,
        }
    }

    pub fn into_income(self, id: impl Into<String>) -> Income {
        Income {
            id: Some(id.into()),
            name: self.name,
            amount: self.amount,
            frequency: self.frequency,
            start_date: self.start_date,
            end_date: self.end_date,
            notes: self.notes,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

// 🧾 Bill Entity - recurring payable with per-month paid status
//
// "Bill id is IDENTITY (assigned by the server), everything else is a VALUE"
//
// - A bill without an id has not been saved yet and cannot be updated
// - Month entries are identified by (year, month, day) within their bill
// - Merging a partial bill never touches the id

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::days_in_month;

// ============================================================================
// MONTH ENTRY
// ============================================================================

/// Paid status of a bill for one due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Month {
    pub year: i32,
    /// 1-based calendar month
    pub month: u32,
    pub day: u32,
    #[serde(default)]
    pub paid: bool,
}

impl Month {
    /// Create an unpaid entry
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Month {
            year,
            month,
            day,
            paid: false,
        }
    }

    /// The (year, month, day) triple identifying this entry within a bill
    pub fn key(&self) -> (i32, u32, u32) {
        (self.year, self.month, self.day)
    }

    /// Build `count` consecutive monthly entries starting at the month of `start`.
    ///
    /// `due_day` is clamped to the length of each month, so a bill due on the
    /// 31st falls on the 30th in April and the 28th/29th in February.
    pub fn schedule(start: NaiveDate, due_day: u32, count: u32) -> Vec<Month> {
        let Some(first) = start.with_day(1) else {
            return Vec::new();
        };

        (0..count)
            .filter_map(|offset| first.checked_add_months(Months::new(offset)))
            .map(|date| {
                let day = due_day.clamp(1, days_in_month(date.year(), date.month()));
                Month::new(date.year(), date.month(), day)
            })
            .collect()
    }
}

// ============================================================================
// BILL ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// Server-assigned identity (None until saved)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    pub amount: f64,

    /// Day of the month the bill falls due
    pub due_day: u32,

    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Ordered per-month entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<Vec<Month>>,
}

impl Bill {
    pub fn new(name: impl Into<String>, amount: f64, due_day: u32, start_date: NaiveDate) -> Self {
        Bill {
            id: None,
            name: name.into(),
            amount,
            due_day,
            start_date,
            end_date: None,
            category: None,
            notes: None,
            months: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Shallow merge: required fields take the incoming value, optional
    /// fields only when the incoming record carries them. The id is kept.
    pub fn merge(&mut self, patch: Bill) {
        self.name = patch.name;
        self.amount = patch.amount;
        self.due_day = patch.due_day;
        self.start_date = patch.start_date;
        if patch.end_date.is_some() {
            self.end_date = patch.end_date;
        }
        if patch.category.is_some() {
            self.category = patch.category;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
        if patch.months.is_some() {
            self.months = patch.months;
        }
    }

    /// Look up a month entry by its due date
    pub fn month(&self, year: i32, month: u32, day: u32) -> Option<&Month> {
        self.months
            .as_ref()?
            .iter()
            .find(|m| m.key() == (year, month, day))
    }

    pub fn month_mut(&mut self, year: i32, month: u32, day: u32) -> Option<&mut Month> {
        self.months
            .as_mut()?
            .iter_mut()
            .find(|m| m.key() == (year, month, day))
    }

    /// Replace the entry with the same due date. Returns false when the bill
    /// has no such entry; nothing is inserted in that case.
    pub fn set_month(&mut self, month: Month) -> bool {
        match self.month_mut(month.year, month.month, month.day) {
            Some(existing) => {
                *existing = month;
                true
            }
            None => false,
        }
    }

    /// Entries due in the given calendar month
    pub fn months_in(&self, year: i32, month: u32) -> impl Iterator<Item = &Month> {
        self.months
            .iter()
            .flatten()
            .filter(move |m| m.year == year && m.month == month)
    }

    /// Number of entries marked paid
    pub fn paid_count(&self) -> usize {
        self.months.iter().flatten().filter(|m| m.paid).count()
    }
}

// ============================================================================
// NEW BILL (creation payload)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBill {
    pub name: String,
    pub amount: f64,
    pub due_day: u32,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewBill {
    pub fn new(name: impl Into<String>, amount: f64, due_day: u32, start_date: NaiveDate) -> Self {
        NewBill {
            name: name.into(),
            amount,
            due_day,
            start_date,
            end_date: None,
            category: None,
            notes: None,
        }
    }

    /// Turn the payload into a stored bill with the given id and schedule
    pub fn into_bill(self, id: impl Into<String>, months: Vec<Month>) -> Bill {
        Bill {
            id: Some(id.into()),
            name: self.name,
            amount: self.amount,
            due_day: self.due_day,
            start_date: self.start_date,
            end_date: self.end_date,
            category: self.category,
            notes: self.notes,
            months: Some(months),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

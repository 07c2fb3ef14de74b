// Entity Models - records exchanged with the bill tracker API
//
// Each entity has:
// - A server-assigned identity (absent until created)
// - Values that are shallow-merged on update
// - camelCase JSON matching the API wire format

pub mod bill;
pub mod income;
pub mod user;

pub use bill::{Bill, Month, NewBill};
pub use income::{Income, IncomeFrequency, NewIncome};
pub use user::User;

use chrono::{Datelike, NaiveDate};

/// Number of days in a calendar month (0 for an invalid month)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    month_bounds(year, month).map_or(0, |(_, last)| last.day())
}

/// First and last day of a calendar month
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

// 📈 Cash Flow - month-by-month projection of bills against income
//
// Bill outflow comes from each bill's Month entries, income inflow from the
// income frequency. The running balance starts at an opening balance.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::entities::{Bill, Income};

// ============================================================================
// MONTH FLOW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthFlow {
    pub year: i32,
    pub month: u32,
    /// Total of all bill entries due this month
    pub bills_due: f64,
    /// Portion of `bills_due` already marked paid
    pub bills_paid: f64,
    pub income: f64,
    /// income - bills_due
    pub net: f64,
    /// Running balance at month end
    pub balance: f64,
}

impl MonthFlow {
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn bills_outstanding(&self) -> f64 {
        self.bills_due - self.bills_paid
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CashFlowTotals {
    pub bills_due: f64,
    pub bills_paid: f64,
    pub income: f64,
    pub net: f64,
}

// ============================================================================
// CASH FLOW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlow {
    pub opening_balance: f64,
    pub months: Vec<MonthFlow>,
}

impl CashFlow {
    /// Project `months` calendar months starting with the month containing `from`
    pub fn project(
        bills: &[Bill],
        incomes: &[Income],
        from: NaiveDate,
        months: u32,
        opening_balance: f64,
    ) -> Self {
        let mut balance = opening_balance;
        let mut flows = Vec::new();

        let Some(first) = from.with_day(1) else {
            return CashFlow {
                opening_balance,
                months: flows,
            };
        };

        for offset in 0..months {
            let Some(date) = first.checked_add_months(Months::new(offset)) else {
                break;
            };
            let (year, month) = (date.year(), date.month());

            let mut bills_due = 0.0;
            let mut bills_paid = 0.0;
            for bill in bills {
                for entry in bill.months_in(year, month) {
                    bills_due += bill.amount;
                    if entry.paid {
                        bills_paid += bill.amount;
                    }
                }
            }

            let income: f64 = incomes.iter().map(|i| i.amount_in(year, month)).sum();
            let net = income - bills_due;
            balance += net;

            flows.push(MonthFlow {
                year,
                month,
                bills_due,
                bills_paid,
                income,
                net,
                balance,
            });
        }

        CashFlow {
            opening_balance,
            months: flows,
        }
    }

    pub fn totals(&self) -> CashFlowTotals {
        self.months.iter().fold(CashFlowTotals::default(), |mut acc, m| {
            acc.bills_due += m.bills_due;
            acc.bills_paid += m.bills_paid;
            acc.income += m.income;
            acc.net += m.net;
            acc
        })
    }

    pub fn closing_balance(&self) -> f64 {
        self.months.last().map_or(self.opening_balance, |m| m.balance)
    }

    /// Month with the lowest running balance
    pub fn lowest_point(&self) -> Option<&MonthFlow> {
        self.months
            .iter()
            .min_by(|a, b| a.balance.total_cmp(&b.balance))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{IncomeFrequency, Month};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bill(name: &str, amount: f64, due_day: u32, months: u32) -> Bill {
        let mut bill = Bill::new(name, amount, due_day, date(2024, 1, 1)).with_id(name);
        bill.months = Some(Month::schedule(bill.start_date, due_day, months));
        bill
    }

    #[test]
    fn test_project_counts_bills_and_income() {
        let mut rent = bill("rent", 1000.0, 1, 12);
        rent.set_month(Month { paid: true, ..Month::new(2024, 1, 1) });
        let gym = bill("gym", 40.0, 20, 1);
        let salary = Income::new("Salary", 700.0, IncomeFrequency::Fortnightly, date(2024, 1, 5));

        let flow = CashFlow::project(&[rent, gym], &[salary], date(2024, 1, 17), 2, 500.0);

        let jan = &flow.months[0];
        assert_eq!(jan.label(), "2024-01");
        assert_eq!(jan.bills_due, 1040.0);
        assert_eq!(jan.bills_paid, 1000.0);
        assert_eq!(jan.bills_outstanding(), 40.0);
        // Jan 5 and Jan 19
        assert_eq!(jan.income, 1400.0);
        assert_eq!(jan.balance, 860.0);

        let feb = &flow.months[1];
        assert_eq!(feb.bills_due, 1000.0);
        // Feb 2 and Feb 16
        assert_eq!(feb.income, 1400.0);
        assert_eq!(flow.closing_balance(), 1260.0);
    }

    #[test]
    fn test_totals_and_lowest_point() {
        let car = bill("car", 600.0, 15, 3);
        let pay = Income::new("Pay", 500.0, IncomeFrequency::Monthly, date(2024, 1, 1));

        let flow = CashFlow::project(&[car], &[pay], date(2024, 1, 1), 4, 0.0);
        let totals = flow.totals();

        assert_eq!(totals.bills_due, 1800.0);
        assert_eq!(totals.income, 2000.0);
        assert_eq!(totals.net, 200.0);
        assert_eq!(flow.lowest_point().unwrap().label(), "2024-03");
        assert_eq!(flow.closing_balance(), 200.0);
    }

    #[test]
    fn test_empty_projection() {
        let flow = CashFlow::project(&[], &[], date(2024, 1, 1), 0, 42.0);
        assert!(flow.months.is_empty());
        assert_eq!(flow.closing_balance(), 42.0);
        assert!(flow.lowest_point().is_none());
    }

    #[test]
    fn test_project_huge_month_count_stops_at_calendar_end() {
        let from = date(262_000, 1, 1);
        let flow = CashFlow::project(&[], &[], from, u32::MAX, 10.0);

        assert!(!flow.months.is_empty());
        assert!(flow.months.len() < 12 * 200);
        let last = flow.months.last().unwrap();
        assert_eq!(last.year, NaiveDate::MAX.year());
        assert_eq!(flow.closing_balance(), 10.0);
    }
}

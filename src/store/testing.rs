// 🧪 Test Support - in-memory API double and sample records for store tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::api::{BillsApi, DateRange, IncomeApi, RequestOptions, SystemApi};
use crate::entities::{Bill, Income, IncomeFrequency, Month, NewBill, NewIncome, User};
use crate::error::{ApiError, ApiResult};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn sample_bill(id: &str, name: &str, amount: f64) -> Bill {
    let mut bill = Bill::new(name, amount, 10, date(2024, 1, 1)).with_id(id);
    bill.months = Some(Month::schedule(bill.start_date, bill.due_day, 3));
    bill
}

pub(crate) fn sample_income(id: &str, name: &str, amount: f64) -> Income {
    Income::new(name, amount, IncomeFrequency::Monthly, date(2024, 1, 15)).with_id(id)
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub bills: Mutex<Vec<Bill>>,
    pub incomes: Mutex<Vec<Income>>,
    pub user: Mutex<Option<User>>,
    pub last_range: Mutex<Option<DateRange>>,
    fail: AtomicBool,
    calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl FakeApi {
    pub fn with_bills(bills: Vec<Bill>) -> Self {
        let api = FakeApi::default();
        *api.bills.lock().unwrap() = bills;
        api
    }

    pub fn with_incomes(incomes: Vec<Income>) -> Self {
        let api = FakeApi::default();
        *api.incomes.lock().unwrap() = incomes;
        api
    }

    /// Make every following call fail with a 500
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> ApiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn not_found(id: &str) -> ApiError {
        ApiError::Status {
            status: 404,
            body: format!("{} not found", id),
        }
    }
}

impl BillsApi for FakeApi {
    async fn get_all_bills(&self, range: DateRange, _options: &RequestOptions) -> ApiResult<Vec<Bill>> {
        self.check()?;
        *self.last_range.lock().unwrap() = Some(range);
        Ok(self.bills.lock().unwrap().clone())
    }

    async fn get_bill(&self, id: &str, _options: &RequestOptions) -> ApiResult<Bill> {
        self.check()?;
        self.bills
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id() == Some(id))
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn update_bill(&self, id: &str, bill: &Bill, options: &RequestOptions) -> ApiResult<Bill> {
        self.check()?;
        options.report_upload(1.0);
        let mut bills = self.bills.lock().unwrap();
        let stored = bills
            .iter_mut()
            .find(|b| b.id() == Some(id))
            .ok_or_else(|| Self::not_found(id))?;
        stored.merge(bill.clone());
        Ok(stored.clone())
    }

    async fn add_bill(&self, bill: &NewBill, options: &RequestOptions) -> ApiResult<Bill> {
        self.check()?;
        options.report_upload(1.0);
        let months = Month::schedule(bill.start_date, bill.due_day, 12);
        let created = bill.clone().into_bill(self.next_id("bill"), months);
        self.bills.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_paid_status(
        &self,
        id: &str,
        year: i32,
        month: u32,
        paid: bool,
        _options: &RequestOptions,
    ) -> ApiResult<Month> {
        self.check()?;
        let mut bills = self.bills.lock().unwrap();
        let bill = bills
            .iter_mut()
            .find(|b| b.id() == Some(id))
            .ok_or_else(|| Self::not_found(id))?;
        let entry = bill
            .months
            .iter_mut()
            .flatten()
            .find(|m| m.year == year && m.month == month)
            .ok_or_else(|| Self::not_found(id))?;
        entry.paid = paid;
        Ok(*entry)
    }
}

impl IncomeApi for FakeApi {
    async fn get_income_sources(
        &self,
        range: DateRange,
        _options: &RequestOptions,
    ) -> ApiResult<Vec<Income>> {
        self.check()?;
        *self.last_range.lock().unwrap() = Some(range);
        Ok(self.incomes.lock().unwrap().clone())
    }

    async fn get_income(&self, id: &str, _options: &RequestOptions) -> ApiResult<Income> {
        self.check()?;
        self.incomes
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id() == Some(id))
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn update_income(
        &self,
        id: &str,
        income: &Income,
        _options: &RequestOptions,
    ) -> ApiResult<Income> {
        self.check()?;
        let mut incomes = self.incomes.lock().unwrap();
        let stored = incomes
            .iter_mut()
            .find(|i| i.id() == Some(id))
            .ok_or_else(|| Self::not_found(id))?;
        stored.merge(income.clone());
        Ok(stored.clone())
    }

    async fn add_income_source(
        &self,
        income: &NewIncome,
        _options: &RequestOptions,
    ) -> ApiResult<Income> {
        self.check()?;
        let created = income.clone().into_income(self.next_id("income"));
        self.incomes.lock().unwrap().push(created.clone());
        Ok(created)
    }
}

impl SystemApi for FakeApi {
    async fn get_current_user(&self) -> ApiResult<User> {
        self.check()?;
        self.user
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Status {
                status: 401,
                body: "not logged in".to_string(),
            })
    }
}

// Unified Store - bills, income and the current user behind one API value
//
// Holds its own caches (separate from standalone stores) and delegates
// each action to the per-resource store logic.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::{BillsApi, DateRange, IncomeApi, SystemApi};
use crate::cashflow::CashFlow;
use crate::entities::{Bill, Income, Month, NewBill, NewIncome, User};
use crate::error::StoreError;
use crate::feedback::Feedback;

use super::{BillStore, IncomeStore, SystemStore};

pub struct UnifiedStore<A> {
    bills: BillStore<A>,
    incomes: IncomeStore<A>,
    system: SystemStore<A>,
}

impl<A> UnifiedStore<A>
where
    A: BillsApi + IncomeApi + SystemApi,
{
    pub fn new(api: Arc<A>, feedback: Feedback) -> Self {
        UnifiedStore {
            bills: BillStore::new(Arc::clone(&api), feedback.clone()),
            incomes: IncomeStore::new(Arc::clone(&api), feedback.clone()),
            system: SystemStore::new(api, feedback),
        }
    }

    // ========================================================================
    // GETTERS
    // ========================================================================

    pub fn bills_list(&self) -> Vec<Bill> {
        self.bills.bills_list()
    }

    pub fn incomes_list(&self) -> Vec<Income> {
        self.incomes.incomes_list()
    }

    pub fn current_user(&self) -> Option<User> {
        self.system.current_user()
    }

    /// Cash flow over the cached bills and income
    pub fn cash_flow(&self, from: NaiveDate, months: u32, opening_balance: f64) -> CashFlow {
        CashFlow::project(&self.bills_list(), &self.incomes_list(), from, months, opening_balance)
    }

    // ========================================================================
    // SYSTEM
    // ========================================================================

    pub async fn get_current_user(&self) {
        self.system.get_current_user().await
    }

    pub fn set_current_user(&self, user: User) {
        self.system.set_current_user(user)
    }

    // ========================================================================
    // INCOME
    // ========================================================================

    pub async fn load_incomes(&self, range: DateRange) {
        self.incomes.load_incomes(range).await
    }

    pub async fn load_income(&self, id: &str) -> Result<Income, StoreError> {
        self.incomes.load_income(id).await
    }

    pub async fn save_income(&self, income: &Income) -> Result<Income, StoreError> {
        self.incomes.save_income(income).await
    }

    pub async fn new_income(&self, income: &NewIncome) -> Result<Income, StoreError> {
        self.incomes.new_income(income).await
    }

    pub async fn get_income_by_id(&self, id: &str) -> Option<Income> {
        self.incomes.get_income_by_id(id).await
    }

    pub fn update_incomes(&self, incomes: Vec<Income>) {
        self.incomes.update_incomes(incomes)
    }

    pub fn update_income(&self, income: Income) -> bool {
        self.incomes.update_income(income)
    }

    pub fn add_income(&self, income: Income) {
        self.incomes.add_income(income)
    }

    // ========================================================================
    // BILLS
    // ========================================================================

    pub async fn load_bills(&self, range: DateRange) {
        self.bills.load_bills(range).await
    }

    pub async fn load_bill(&self, id: &str) -> Result<Bill, StoreError> {
        self.bills.load_bill(id).await
    }

    pub async fn save_bill(&self, bill: &Bill) -> Result<Bill, StoreError> {
        self.bills.save_bill(bill).await
    }

    pub async fn new_bill(&self, bill: &NewBill) -> Result<Bill, StoreError> {
        self.bills.new_bill(bill).await
    }

    pub async fn change_paid_status(&self, id: &str, month: Month) -> Result<Month, StoreError> {
        self.bills.change_paid_status(id, month).await
    }

    pub async fn get_bill_by_id(&self, id: &str) -> Option<Bill> {
        self.bills.get_bill_by_id(id).await
    }

    pub fn update_bills(&self, bills: Vec<Bill>) {
        self.bills.update_bills(bills)
    }

    pub fn update_bill(&self, bill: Bill) -> bool {
        self.bills.update_bill(bill)
    }

    pub fn add_bill(&self, bill: Bill) {
        self.bills.add_bill(bill)
    }

    pub fn update_month(&self, id: &str, month: Month) -> bool {
        self.bills.update_month(id, month)
    }
}

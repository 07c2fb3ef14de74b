// 💰 Income Store - cached income sources over the income API

use std::sync::Arc;

use crate::api::{DateRange, IncomeApi};
use crate::entities::{Income, NewIncome};
use crate::error::StoreError;
use crate::feedback::{Feedback, NotifyKind};

use super::cache::Cache;

const LOAD_FAILED: &str = "An error occurred loading Income items from the API";
const SAVE_FAILED: &str = "An error occurred saving the Income updates";

pub struct IncomeStore<A> {
    api: Arc<A>,
    feedback: Feedback,
    incomes: Cache<Income>,
}

impl<A: IncomeApi> IncomeStore<A> {
    pub fn new(api: Arc<A>, feedback: Feedback) -> Self {
        IncomeStore {
            api,
            feedback,
            incomes: Cache::new(),
        }
    }

    pub fn incomes_list(&self) -> Vec<Income> {
        self.incomes.all()
    }

    pub fn cached_income(&self, id: &str) -> Option<Income> {
        self.incomes.find(id)
    }

    pub async fn load_incomes(&self, range: DateRange) {
        let options = self.feedback.progress_init();
        match self.api.get_income_sources(range, &options).await {
            Ok(incomes) => {
                tracing::info!(count = incomes.len(), "income sources loaded");
                self.update_incomes(incomes);
                self.feedback.stop();
            }
            Err(e) => {
                self.feedback.notify(LOAD_FAILED, NotifyKind::Negative);
                tracing::error!(error = %e, "loading income sources failed");
            }
        }
        self.feedback.increment(Some(100.0));
    }

    pub async fn load_income(&self, id: &str) -> Result<Income, StoreError> {
        let options = self.feedback.progress_init();
        match self.api.get_income(id, &options).await {
            Ok(income) => {
                self.feedback.increment(Some(100.0));
                self.add_income(income.clone());
                Ok(income)
            }
            Err(e) => {
                self.feedback.stop();
                self.feedback.notify(LOAD_FAILED, NotifyKind::Negative);
                tracing::error!(id, error = %e, "loading income failed");
                Err(e.into())
            }
        }
    }

    pub async fn save_income(&self, income: &Income) -> Result<Income, StoreError> {
        let Some(id) = income.id() else {
            let err = StoreError::MissingId("Income");
            self.feedback.notify(&err.to_string(), NotifyKind::Negative);
            return Err(err);
        };

        let options = self.feedback.progress_init();
        match self.api.update_income(id, income, &options).await {
            Ok(saved) => {
                self.feedback.increment(Some(100.0));
                self.update_income(saved.clone());
                tracing::info!(id, "income saved");
                Ok(saved)
            }
            Err(e) => {
                self.feedback.stop();
                self.feedback.notify(SAVE_FAILED, NotifyKind::Negative);
                tracing::error!(id, error = %e, "saving income failed");
                Err(e.into())
            }
        }
    }

    pub async fn new_income(&self, income: &NewIncome) -> Result<Income, StoreError> {
        let options = self.feedback.progress_init();
        match self.api.add_income_source(income, &options).await {
            Ok(created) => {
                self.feedback.increment(Some(100.0));
                self.add_income(created.clone());
                tracing::info!(id = created.id(), "income created");
                Ok(created)
            }
            Err(e) => {
                self.feedback.stop();
                self.feedback.notify(SAVE_FAILED, NotifyKind::Negative);
                tracing::error!(error = %e, "creating income failed");
                Err(e.into())
            }
        }
    }

    pub async fn get_income_by_id(&self, id: &str) -> Option<Income> {
        if let Some(income) = self.incomes.find(id) {
            return Some(income);
        }

        let options = self.feedback.progress_init();
        match self.api.get_income(id, &options).await {
            Ok(income) => {
                self.feedback.increment(Some(100.0));
                self.add_income(income.clone());
                Some(income)
            }
            Err(e) => {
                self.feedback.stop();
                self.feedback
                    .notify(&format!("Unable to load Income with ID: {}", id), NotifyKind::Negative);
                tracing::warn!(id, error = %e, "income lookup failed");
                None
            }
        }
    }

    pub fn update_incomes(&self, incomes: Vec<Income>) {
        self.incomes.replace_all(incomes);
    }

    pub fn update_income(&self, income: Income) -> bool {
        let merged = self.incomes.merge(income);
        if !merged {
            tracing::debug!("update for uncached income ignored");
        }
        merged
    }

    pub fn add_income(&self, income: Income) {
        self.incomes.upsert(income);
    }
}

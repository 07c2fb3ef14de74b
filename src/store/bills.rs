// 🧾 Bill Store - cached bills over the bills API
//
// Every action follows the same pattern: start progress, call the API,
// merge the response into the cache on success, or notify the user and
// leave the cache untouched on failure.

use std::sync::Arc;

use crate::api::{BillsApi, DateRange};
use crate::entities::{Bill, Month, NewBill};
use crate::error::StoreError;
use crate::feedback::{Feedback, NotifyKind};

use super::cache::Cache;

const LOAD_FAILED: &str = "An error occurred loading Bill items from the API";
const SAVE_FAILED: &str = "An error occurred saving the bill updates";

pub struct BillStore<A> {
    api: Arc<A>,
    feedback: Feedback,
    bills: Cache<Bill>,
}

impl<A: BillsApi> BillStore<A> {
    pub fn new(api: Arc<A>, feedback: Feedback) -> Self {
        BillStore {
            api,
            feedback,
            bills: Cache::new(),
        }
    }

    // ========================================================================
    // GETTERS
    // ========================================================================

    pub fn bills_list(&self) -> Vec<Bill> {
        self.bills.all()
    }

    /// Cached bill by id, without touching the API
    pub fn cached_bill(&self, id: &str) -> Option<Bill> {
        self.bills.find(id)
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    /// Replace the cache with the server's bills. Failures are reported to
    /// the user and swallowed.
    pub async fn load_bills(&self, range: DateRange) {
        let options = self.feedback.progress_init();
        match self.api.get_all_bills(range, &options).await {
            Ok(bills) => {
                tracing::info!(count = bills.len(), "bills loaded");
                self.update_bills(bills);
                self.feedback.stop();
            }
            Err(e) => {
                self.feedback.notify(LOAD_FAILED, NotifyKind::Negative);
                tracing::error!(error = %e, "loading bills failed");
            }
        }
        self.feedback.increment(Some(100.0));
    }

    pub async fn load_bill(&self, id: &str) -> Result<Bill, StoreError> {
        let options = self.feedback.progress_init();
        match self.api.get_bill(id, &options).await {
            Ok(bill) => {
                self.feedback.increment(Some(100.0));
                self.add_bill(bill.clone());
                Ok(bill)
            }
            Err(e) => {
                self.feedback.stop();
                self.feedback.notify(LOAD_FAILED, NotifyKind::Negative);
                tracing::error!(id, error = %e, "loading bill failed");
                Err(e.into())
            }
        }
    }

    /// Send an edited bill to the server and merge the saved version into the cache.
    pub async fn save_bill(&self, bill: &Bill) -> Result<Bill, StoreError> {
        let Some(id) = bill.id() else {
            let err = StoreError::MissingId("bill");
            self.feedback.notify(&err.to_string(), NotifyKind::Negative);
            return Err(err);
        };

        let options = self.feedback.progress_init();
        match self.api.update_bill(id, bill, &options).await {
            Ok(saved) => {
                self.feedback.increment(Some(100.0));
                self.update_bill(saved.clone());
                tracing::info!(id, "bill saved");
                Ok(saved)
            }
            Err(e) => {
                self.feedback.stop();
                self.feedback.notify(SAVE_FAILED, NotifyKind::Negative);
                tracing::error!(id, error = %e, "saving bill failed");
                Err(e.into())
            }
        }
    }

    pub async fn new_bill(&self, bill: &NewBill) -> Result<Bill, StoreError> {
        let options = self.feedback.progress_init();
        match self.api.add_bill(bill, &options).await {
            Ok(created) => {
                self.feedback.increment(Some(100.0));
                self.add_bill(created.clone());
                tracing::info!(id = created.id(), "bill created");
                Ok(created)
            }
            Err(e) => {
                self.feedback.stop();
                self.feedback.notify(SAVE_FAILED, NotifyKind::Negative);
                tracing::error!(error = %e, "creating bill failed");
                Err(e.into())
            }
        }
    }

    /// Set the paid flag for one month of a bill.
    pub async fn change_paid_status(&self, id: &str, month: Month) -> Result<Month, StoreError> {
        let options = self.feedback.progress_init();
        match self
            .api
            .update_paid_status(id, month.year, month.month, month.paid, &options)
            .await
        {
            Ok(updated) => {
                self.feedback.increment(Some(100.0));
                self.update_month(id, updated);
                tracing::info!(id, year = updated.year, month = updated.month, paid = updated.paid, "paid status changed");
                Ok(updated)
            }
            Err(e) => {
                self.feedback.stop();
                self.feedback.notify(SAVE_FAILED, NotifyKind::Negative);
                tracing::error!(id, error = %e, "changing paid status failed");
                Err(e.into())
            }
        }
    }

    /// Cached bill, fetched from the API on a miss. A failed fetch is
    /// reported to the user and yields None.
    pub async fn get_bill_by_id(&self, id: &str) -> Option<Bill> {
        if let Some(bill) = self.bills.find(id) {
            return Some(bill);
        }

        let options = self.feedback.progress_init();
        match self.api.get_bill(id, &options).await {
            Ok(bill) => {
                self.feedback.increment(Some(100.0));
                self.add_bill(bill.clone());
                Some(bill)
            }
            Err(e) => {
                self.feedback.stop();
                self.feedback
                    .notify(&format!("Unable to load bill with ID: {}", id), NotifyKind::Negative);
                tracing::warn!(id, error = %e, "bill lookup failed");
                None
            }
        }
    }

    // ========================================================================
    // LOCAL MUTATIONS
    // ========================================================================

    pub fn update_bills(&self, bills: Vec<Bill>) {
        self.bills.replace_all(bills);
    }

    /// Shallow-merge into the cached bill with the same id; false if not cached
    pub fn update_bill(&self, bill: Bill) -> bool {
        let merged = self.bills.merge(bill);
        if !merged {
            tracing::debug!("update for uncached bill ignored");
        }
        merged
    }

    pub fn add_bill(&self, bill: Bill) {
        self.bills.upsert(bill);
    }

    /// Replace the month entry with the same (year, month, day) in the given bill
    pub fn update_month(&self, id: &str, month: Month) -> bool {
        let replaced = self.bills.update(id, |bill| bill.set_month(month)).unwrap_or(false);
        if !replaced {
            tracing::debug!(id, year = month.year, month = month.month, day = month.day, "no matching month entry");
        }
        replaced
    }
}

// ============================================================================
// TESTS
// ============================================================================

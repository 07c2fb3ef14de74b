// 🔌 API Traits - typed surface the stores call into
// The three traits follow the backend's resource groups. HttpApi implements
// all of them; tests substitute an in-memory fake.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::entities::{Bill, Income, Month, NewBill, NewIncome, User};
use crate::error::ApiResult;

/// Callback receiving the fraction (0.0..=1.0) of the request body sent.
pub type UploadProgress = Arc<dyn Fn(f64) + Send + Sync>;

/// Per-request options passed alongside every API call.
#[derive(Clone, Default)]
pub struct RequestOptions {
    on_upload_progress: Option<UploadProgress>,
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("on_upload_progress", &self.on_upload_progress.is_some())
            .finish()
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_upload_progress(mut self, callback: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_upload_progress = Some(Arc::new(callback));
        self
    }

    /// Report upload progress to the registered callback, if any.
    pub fn report_upload(&self, fraction: f64) {
        if let Some(callback) = &self.on_upload_progress {
            callback(fraction.clamp(0.0, 1.0));
        }
    }
}

/// Optional date window for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    /// No bounds: everything the server has.
    pub fn all() -> Self {
        Self::default()
    }

    /// Query parameters for the bounds that are set.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = self.start {
            params.push(("start", start.to_string()));
        }
        if let Some(end) = self.end {
            params.push(("end", end.to_string()));
        }
        params
    }
}

/// Bill resource operations.
pub trait BillsApi: Send + Sync {
    fn get_all_bills(
        &self,
        range: DateRange,
        options: &RequestOptions,
    ) -> impl Future<Output = ApiResult<Vec<Bill>>> + Send;

    fn get_bill(&self, id: &str, options: &RequestOptions)
        -> impl Future<Output = ApiResult<Bill>> + Send;

    fn update_bill(
        &self,
        id: &str,
        bill: &Bill,
        options: &RequestOptions,
    ) -> impl Future<Output = ApiResult<Bill>> + Send;

    fn add_bill(
        &self,
        bill: &NewBill,
        options: &RequestOptions,
    ) -> impl Future<Output = ApiResult<Bill>> + Send;

    /// Set the paid flag of the bill's entry for `year`/`month`; returns the updated entry.
    fn update_paid_status(
        &self,
        id: &str,
        year: i32,
        month: u32,
        paid: bool,
        options: &RequestOptions,
    ) -> impl Future<Output = ApiResult<Month>> + Send;
}

/// Income source operations.
pub trait IncomeApi: Send + Sync {
    fn get_income_sources(
        &self,
        range: DateRange,
        options: &RequestOptions,
    ) -> impl Future<Output = ApiResult<Vec<Income>>> + Send;

    fn get_income(
        &self,
        id: &str,
        options: &RequestOptions,
    ) -> impl Future<Output = ApiResult<Income>> + Send;

    fn update_income(
        &self,
        id: &str,
        income: &Income,
        options: &RequestOptions,
    ) -> impl Future<Output = ApiResult<Income>> + Send;

    fn add_income_source(
        &self,
        income: &NewIncome,
        options: &RequestOptions,
    ) -> impl Future<Output = ApiResult<Income>> + Send;
}

/// Current-user and system information.
pub trait SystemApi: Send + Sync {
    fn get_current_user(&self) -> impl Future<Output = ApiResult<User>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_query_only_includes_set_bounds() {
        assert!(DateRange::all().query().is_empty());

        let range = DateRange::new(Some(date(2024, 1, 1)), None);
        assert_eq!(range.query(), vec![("start", "2024-01-01".to_string())]);

        let range = DateRange::new(Some(date(2024, 1, 1)), Some(date(2024, 3, 31)));
        assert_eq!(range.query().len(), 2);
    }

    #[test]
    fn test_request_options_report_upload_clamps() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = RequestOptions::new().on_upload_progress(move |f| sink.lock().unwrap().push(f));

        options.report_upload(0.5);
        options.report_upload(3.0);
        RequestOptions::new().report_upload(1.0);

        assert_eq!(*seen.lock().unwrap(), vec![0.5, 1.0]);
    }
}

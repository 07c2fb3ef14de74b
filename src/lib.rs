// Bill Tracker - Core Library
// Typed API client, cached stores and cash flow for the CLI, dev backend and tests

pub mod api;
pub mod bootstrap;
pub mod cashflow;
pub mod config;
pub mod entities;
pub mod error;
pub mod feedback;
pub mod http;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use api::{BillsApi, DateRange, IncomeApi, RequestOptions, SystemApi};
pub use bootstrap::{connect, install, resolve_config, ConfigSource, Stores};
pub use cashflow::{CashFlow, CashFlowTotals, MonthFlow};
pub use config::{ApiConfig, BaseOptions, DEFAULT_API_PORT, DEFAULT_BASE_PATH, ENVIRONMENT_PATH};
pub use entities::{Bill, Income, IncomeFrequency, Month, NewBill, NewIncome, User};
pub use error::{ApiError, ApiResult, StoreError};
pub use feedback::{Feedback, Notifier, NotifyKind, Progress};
pub use http::HttpApi;
pub use store::{BillStore, IncomeStore, SystemStore, UnifiedStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

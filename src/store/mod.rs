// Store Modules - client-side state over the API client
//
// One store per resource plus a unified store. Each store owns a cache,
// an API handle and the feedback sinks injected at bootstrap.

pub mod bills;
pub mod cache;
pub mod income;
pub mod system;
pub mod unified;

#[cfg(test)]
pub(crate) mod testing;

pub use bills::BillStore;
pub use cache::{Cache, Record};
pub use income::IncomeStore;
pub use system::SystemStore;
pub use unified::UnifiedStore;

//! Read-side SQL for the dashboard.
//!
//! Every function takes a plain `rusqlite::Connection` and is synchronous;
//! handlers run them through `AsyncDb::call_named` so each operation shows
//! up in the latency metrics under its own name. Keeping the SQL sync also
//! means the tests below run against an in-memory database with no runtime.

pub mod agents;
pub mod alerts;
pub mod history;
pub mod insights;
pub mod markets;
pub mod overview;
pub mod pairs;
pub mod smart;
pub mod traders;
pub mod watchlist;
pub mod whales;

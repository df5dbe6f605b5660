pub mod config;
pub mod fetch;
pub mod filter;
pub mod ingest;
pub mod months;
pub mod output;
pub mod parser;
pub mod progress;
pub mod schema;
pub mod table;

pub use config::{FetchSettings, RunConfig};
pub use ingest::RangeFetcher;
pub use months::{DateRange, MonthKey, enumerate_months};
pub use table::RowTable;

//! Supermarket sales reporting: load the transactions once, filter them by
//! city, gender, customer type and hour, and summarise the result into the
//! KPIs and chart series the dashboard draws.

pub mod config;
pub mod data;
pub mod report;

pub use config::{AppConfig, SourceConfig};
pub use data::error::LoadError;
pub use data::filter::{Dimension, FilterSpec, HourRange, Selection, apply};
pub use data::loader::{DatasetCache, load};
pub use data::model::{Dataset, GroupKey, Record};
pub use report::{Kpis, Report};

//! Data layer: core types, loading, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .xlsx / .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse region → Dataset (cached once)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Dataset  │  Vec<Record>, selector options
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  apply FilterSpec → Selection (row indices)
//!   └──────────┘
//!        │  drop_incomplete
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  group_sum / group_count / group_mean
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;

/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table → bind → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, indicator list, institutions, years
///   └──────────┘
///        │  FilterCriteria
///        ▼
///   ┌──────────┐
///   │  filter   │  year range + institution selection → Subset
///   └──────────┘
///        │
///        ├──► aggregate   sums per year / institution → AggregatedView → Table
///        ├──► compare     allocated vs. executed gap
///        ├──► regression  OLS fits over measure pairs
///        └──► query       keyword lookup → (year, measure) Table
/// ```

pub mod aggregate;
pub mod compare;
pub mod filter;
pub mod loader;
pub mod model;
pub mod query;
pub mod regression;
pub mod table;

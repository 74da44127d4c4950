/// Data layer: core types, loading, joining and aggregation.
///
/// Architecture:
/// ```text
///  measurement workbook      weight table
///        │                         │
///        └────────────┬────────────┘
///                     ▼
///   ┌──────────┐
///   │  loader   │  sheets → Vec<CompoundTable>, first two columns → Vec<WeightRow>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  merge    │  inner join on Filename, normalized value → MergedTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  mean / std per Sample ID (first-seen order) → CompoundSummary
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  key-checked join of all compounds → SummaryTable
///   └──────────┘
/// ```

pub mod aggregate;
pub mod loader;
pub mod merge;
pub mod model;
pub mod summary;

/// Data layer: source tables, the merged table, filtering and diagnostics.
///
/// Architecture:
/// ```text
///  https://… / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  fetch or open → loader decodes → RawTable (wide)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   etl     │  melt, join, backfill, aggregate → MortalityTable
///   └──────────┘
///        │  (built once, shared read-only)
///        ▼
///   ┌──────────┐
///   │  filter   │  year → sex → country → cancer → row indices
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ diagnostics  │  requested vs. present countries
///   └─────────────┘
/// ```

pub mod diagnostics;
pub mod error;
pub mod etl;
pub mod filter;
pub mod loader;
pub mod model;
pub mod source;

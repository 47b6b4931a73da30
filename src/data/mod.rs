/// Data layer: raw loading, cleaning, and the table queries.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable (text / number / null cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  per-cell cleaning + median imputation → FoodTable
///   └──────────┘
///        │
///        ▼
///   ┌─────────────────────┐
///   │ filter / breakdown  │  recommendations, macro composition
///   └─────────────────────┘
/// ```

pub mod breakdown;
pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;

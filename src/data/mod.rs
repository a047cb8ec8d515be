/// Data layer: core types, loading, derivation and writing.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  calendar + FX + first-visit columns (optional)
///   └──────────┘
///        │
///        ├──────────────► writer  (--preprocess: persist augmented table)
///        ▼
///   ┌──────────┐
///   │  Table    │  held for the session, read by the views
///   └──────────┘
/// ```

pub mod derive;
pub mod loader;
pub mod model;
pub mod writer;

#[cfg(test)]
mod tests;

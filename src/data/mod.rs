//! Data layer: table model, loading, the condition engine and plot binding.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → OperatingPointTable (+ derived columns)
//!   └──────────┘
//!        │                         ┌──────────┐
//!        ├────────────────────────▶│  sizing   │  optional W rescaling
//!        ▼                         └──────────┘
//!   ┌──────────────┐
//!   │ condition +   │  (column, op, threshold) list → FilteredView
//!   │ filter        │
//!   └──────────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ projection +  │  x/y/hue → plotted markers; click → table row
//!   │ pick          │
//!   └──────────────┘
//! ```

pub mod condition;
pub mod derived;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pick;
pub mod projection;
pub mod sizing;
pub mod units;

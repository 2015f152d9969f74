/// Data layer: grid, curve loading, stacking, and export.
///
/// Architecture:
/// ```text
///  .csv / .xlsx (one file per filter)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse → normalise units → bounded cubic spline
///   └──────────┘
///        │  sampled on the shared WavelengthGrid
///        ▼
///   ┌──────────┐
///   │ FilterSet │  name → FilterCurve
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stack    │  Π curve^exponent per stack
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  <stack name>.csv
///   └──────────┘
/// ```

pub mod export;
pub mod grid;
pub mod loader;
pub mod model;
pub mod spline;
pub mod stack;

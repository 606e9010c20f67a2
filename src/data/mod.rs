//! Data layer: trace naming, loading, per-trace computations and the batch
//! pipeline that ties them together.
//!
//! ```text
//!   patterns ("PM_1_*_Imon.npy")
//!        │
//!        ▼
//!   ┌──────────┐   expand, dedupe, sort by TraceKey
//!   │ pipeline │──────────────────────────────────┐
//!   └──────────┘                                  │
//!        │ per trace                              ▼
//!        ├──► loader (.json sidecar, .npy/.bin)   key
//!        ├──► axis   (x_0, delta_x, numpnts → x)
//!        └──► stats  (mean over [first, last))
//!        │
//!        ▼
//!   Vec<DerivedResult>  ──► report (text) / CurveSet + filter (viewer)
//! ```

pub mod axis;
pub mod error;
pub mod filter;
pub mod key;
pub mod loader;
pub mod model;
pub mod npy;
pub mod pipeline;
pub mod stats;

//! Pure sequence operations behind the comparison pipeline.
//!
//! Everything here is deterministic and allocation-per-call: safe to use
//! concurrently on disjoint data.

pub mod correlate;
pub mod score;
pub mod smooth;

pub use correlate::find_lag;
pub use score::score;
pub use smooth::{smooth, WindowKind};

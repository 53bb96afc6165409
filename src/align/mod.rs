//! Track comparison and offset recovery.
//!
//! [`AlignmentEngine`] drives the whole pipeline: onset envelopes from two
//! opened tracks are length-equalized, smoothed, scored for similarity and
//! cross-correlated for the playback offset between them.

pub mod engine;

pub use engine::{AlignmentEngine, ComparisonResult};

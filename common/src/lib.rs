//! Pure reconciliation core shared by the reaper engine.
//!
//! This crate provides:
//! - Set partitioning of catalog hosts against monitoring targets
//! - Exact-match and pattern exclusion of targets
//! - Extraction of identifiers embedded in Circonus CIDs and metric names
//! - The per-metric disposition rules used to retoggle allocation metrics
//! - Run statistics and their summary report
//!
//! Nothing in here performs I/O.
#![cfg_attr(
    test,
    expect(clippy::indexing_slicing, reason = "This is not problematic in tests",)
)]

extern crate alloc;
extern crate core;

mod disposition;
mod exclusion;
mod model;
mod naming;
mod sets;
mod stats;

pub use disposition::*;
pub use exclusion::*;
pub use model::*;
pub use naming::*;
pub use sets::*;
pub use stats::*;

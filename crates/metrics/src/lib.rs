//! Metrics to evaluate the output of the WFST toolset against references.
//!
//! Forbid unsafe code in this crate.
#![forbid(unsafe_code)]

mod cer;
mod levenshtein;

pub use cer::*;
pub use levenshtein::*;

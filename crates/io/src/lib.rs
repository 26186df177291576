//! Utility types and functions related to IO for the WFST toolset.
//!
//! Forbid unsafe code in this crate.
#![forbid(unsafe_code)]

mod corpus;
mod progress;

pub use corpus::*;
pub use progress::*;

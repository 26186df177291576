//! Utility types and functions for the WFST toolset.
//!
//! Forbid unsafe code in this crate.
#![forbid(unsafe_code)]

mod error;
mod random_test;

pub use error::*;
pub use random_test::*;

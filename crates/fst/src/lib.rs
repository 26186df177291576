//!
//! A crate containing weighted finite state transducers, their composition,
//! weight estimation and related functionality.
//!
//! This crate does not use unsafe code.

#![forbid(unsafe_code)]

mod acceptor;
mod composition;
mod error;
mod estimate;
mod finite_state_transducer;
mod io_dot;
mod ngram;
mod random_fst;
mod sort_topological;
mod symbol;
mod transition;
mod values;

pub use acceptor::*;
pub use composition::*;
pub use error::*;
pub use estimate::*;
pub use finite_state_transducer::*;
pub use io_dot::*;
pub use ngram::*;
pub use random_fst::*;
pub use sort_topological::*;
pub use symbol::*;
pub use transition::*;
pub use values::*;

use std::error::Error;

/// The error type used by the tools and the I/O functions, which can contain
/// any error so that `?` can be used across crates.
pub type WfstError = Box<dyn Error>;

//! Utility modules.
//!
//! - [`log`]: Coloured, levelled logging macros
//! - [`test_utils`]: Shared fixtures for tests

pub mod log;
pub mod test_utils;

//! ANE backend application library
//!
//! Holds the project modules mounted by the HTTP server. The only module today
//! is the Thingiverse catalog proxy behind `/api/models`.

pub mod app;
pub mod modules;

/// Re-export commonly used types
pub use modules::*;

//! Utility functions shared by the binary and the library.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory and configuration
//! - [`logging`] - `tracing` subscriber setup
//! - [`progress`] - Progress bars that compile away without the `progress` feature

pub mod app_data;
pub mod logging;
pub mod progress;

pub use app_data::*;
pub use logging::{LogTarget, LOG_ENV};

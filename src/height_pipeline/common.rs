//! Common utilities module
//!
//! This module contains the error type shared by every pipeline stage.

pub mod error;

pub use error::{ProcessorError, Result};

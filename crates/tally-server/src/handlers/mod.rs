//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod charts;
pub mod expenses;
pub mod health;
pub mod investments;
pub mod ocr;

// Re-export all handlers for use in router
pub use charts::*;
pub use expenses::*;
pub use health::*;
pub use investments::*;
pub use ocr::*;

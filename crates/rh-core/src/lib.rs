//! robohub/crates/rh-core/src/lib.rs
//!
//! The central domain logic and interface definitions for RoboHub.

pub mod dashboard;
pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use dashboard::*;
pub use error::*;
pub use models::*;
pub use traits::*;

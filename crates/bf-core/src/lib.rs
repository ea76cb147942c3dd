//! birdfeed/crates/bf-core/src/lib.rs
//!
//! The central domain logic and interface definitions for birdfeed.

pub mod clock;
pub mod error;
pub mod feed;
pub mod models;
pub mod service;
pub mod traits;

// Re-exporting for easier access in other crates
pub use clock::*;
pub use error::*;
pub use models::*;
pub use service::*;
pub use traits::*;

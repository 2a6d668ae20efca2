//! igx/crates/igx-core/src/lib.rs
//!
//! Domain models, port traits, and the pure mention/notification logic for IGX.
//!
//! Everything in [`mention`], [`suggest`], [`render`] and [`notify`] is a
//! synchronous function over in-memory values. The web layer calls into these
//! modules; they never call out.

pub mod error;
pub mod mention;
pub mod models;
pub mod notify;
pub mod render;
pub mod suggest;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

//! Workspace umbrella crate.
//!
//! Re-exports the service façade so host applications can depend on
//! `bucket-tunes` and enable `desktop-shims` without wiring each workspace
//! crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;

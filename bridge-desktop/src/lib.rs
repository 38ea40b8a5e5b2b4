//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts.
//!
//! ## Overview
//!
//! - `LocalObjectStore`: `ObjectStore` over a local directory using `tokio::fs`
//! - `MemoryObjectStore`: `ObjectStore` kept in process memory (tests, demos)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::LocalObjectStore;
//! use bridge_traits::ObjectStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = LocalObjectStore::with_root("/srv/objects");
//!     let objects = store.list("music", None).await.unwrap();
//! }
//! ```

mod filesystem;
mod memory;

pub use filesystem::LocalObjectStore;
pub use memory::MemoryObjectStore;

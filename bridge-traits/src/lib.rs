//! # Host Bridge Traits
//!
//! Capability traits the core depends on but does not implement itself.
//!
//! ## Traits
//!
//! - [`ObjectStore`](storage::ObjectStore) - Bucket listing, upload and fetch
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Implementations
//!
//! | Capability    | Crate            | Types                                   |
//! |---------------|------------------|-----------------------------------------|
//! | `ObjectStore` | `bridge-desktop` | `LocalObjectStore`, `MemoryObjectStore` |
//! | `Clock`       | this crate       | `SystemClock`, `FixedClock`             |
//! | `LoggerSink`  | host application | forwarded by `core_runtime::logging`    |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert provider-specific failures into it and keep messages free of
//! credentials.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared across
//! concurrent requests behind an `Arc`.

pub mod error;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use storage::{ObjectBody, ObjectStore, ObjectSummary};
pub use time::{Clock, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};

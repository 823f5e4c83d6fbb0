//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (timestamps for lifetime stats)
//! - Storage (LocalStorage on web, a save directory natively)

pub mod storage;
pub mod time;

pub use storage::default_store;
pub use time::now_ms;

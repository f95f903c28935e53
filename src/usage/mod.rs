//! # Usage Tracking Module
//!
//! Per-clip usage history that drives fair rotation across runs.
//!
//! ## Overview
//!
//! Every generation run stamps the clips it used with the run time and bumps
//! their use count. The rotation selector reads that history to favour clips
//! that have gone unused the longest.
//!
//! ## Data Format
//!
//! ```json
//! {
//!   "beach.mp4": {
//!     "last_used": 1717171717.25,
//!     "usage_count": 4
//!   }
//! }
//! ```
//!
//! Clips missing from the file count as never used.

mod storage;

pub use storage::{
    ClipRecord, JsonUsageStore, MemoryUsageStore, UsageStore, UsageTable, DEFAULT_USAGE_FILE,
};

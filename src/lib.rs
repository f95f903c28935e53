//! Viral Clips - compile short videos from a clip folder and a music folder
//!
//! This library provides the core functionality for discovering media,
//! rotating clips fairly across runs, persisting usage history, and handing
//! the final cut to an external transcoder.

pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod rotation;
pub mod transcode;
pub mod usage;

pub use error::{ClipError, ClipResult};
pub use generator::{GenerateRequest, Generator, RunError, RunReport, RunStage, Selection};

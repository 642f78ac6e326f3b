//! taskbell - task tracking with push reminders
//!
//! This library provides a local task list with optional gist sync, and a
//! small push notification broadcaster: a subscriber registry, notification
//! templates, a fan-out dispatcher and a recurring reminder scheduler.
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod notification;
pub mod scheduler;
pub mod storage;
pub mod supervisor;
pub mod sync;
pub mod tasks;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-export core types for convenience
pub use crate::core::*;

//! Shared utilities for pacekeeper
//!
//! This crate provides:
//! - ID types (SessionId)
//! - Wall-clock time types (WallClock, MinuteWindow, DaysOfWeek)
//! - Default paths for the data directory and policy search order

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;

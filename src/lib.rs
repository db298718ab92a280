//! Terminal dashboard for focused work. Tracks active and AFK time of a session, keeps a per-day
//! log of finished sessions and shows progress towards a daily goal, a countdown, a calendar and
//! a todo grid.
//!

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod storage;
pub mod tracker;
pub mod utils;

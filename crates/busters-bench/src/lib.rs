//! Tracking benchmark: runs ghost-tracking episodes from a YAML scenario and
//! reports how well each tracker variant locates the ghosts.

pub mod analytics;
pub mod config;
pub mod logging;
pub mod simulation;

#![deny(warnings)]
//! Discrete probabilistic inference over a Pac-Man style board.
//!
//! - `factor`: probability tables and the join/eliminate/normalize algebra.
//! - `net`: Bayes nets with exact and sampling queries.
//! - `belief`: sequential ghost trackers (exact forward updates and particle filtering).
//! - `model`: the grid, agents and the board view trackers read from.
//! - `sensor`: the noisy sonar observation model.

pub mod belief;
pub mod factor;
pub mod model;
pub mod net;
pub mod sensor;

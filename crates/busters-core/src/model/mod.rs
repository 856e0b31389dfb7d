//! Board model consumed by the trackers: grid coordinates, walls, layouts and
//! the narrow interfaces to the game state and ghost policies.

pub mod direction;
pub mod layout;
pub mod policy;
pub mod position;
pub mod state;
pub mod walls;

pub use direction::Direction;
pub use layout::{Layout, LayoutError};
pub use policy::{GhostAgent, GhostContext, GhostPolicy};
pub use position::Position;
pub use state::{BoardSnapshot, GameView};
pub use walls::Walls;

pub mod policy;

pub use policy::{DirectionalGhost, PolicyKind, RandomGhost, sample_action};

// Use cases layer: application workflows for the arena server.

pub mod arena;
pub mod game;
pub mod join;
pub mod types;

pub use arena::{Arena, ArenaSettings};
pub use game::{ArenaHandle, ArenaRuntime};
pub use join::{JoinArbiter, JoinOutcome};
pub use types::{
    ArenaEvent, ArenaStatus, DespawnReason, GameEvent, OwnerState, PelletSnapshot, WorldUpdate,
};

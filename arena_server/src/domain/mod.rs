// Domain layer: core simulation types and rules.

pub mod actor;
pub mod color;
pub mod pellets;
pub mod replica;
pub mod role;
pub mod state;
pub mod systems;
pub mod tuning;
pub mod world;

pub use actor::{Actor, ActorController, ScoreChange};
pub use color::Color;
pub use pellets::{PelletDelta, PelletError, PelletField};
pub use replica::{PelletInstance, PelletMirror};
pub use role::Role;
pub use state::{ActorSnapshot, PlayerInput};

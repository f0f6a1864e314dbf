// Gameplay tuning, kept apart from runtime/server configuration.

pub mod actor;
pub mod pellet;

// Domain-level input and snapshot types.

use glam::Vec3;

/// Directional input sampled by the controlling client once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug, Clone)]
pub struct ActorSnapshot {
    pub id: u64,
    pub connection_id: u64,
    pub position: Vec3,
    pub direction: Vec3,
    pub score: i32,
    pub radius: f32,
    pub mercy_time: f32,
    // Emission strength for the spawn-protection flash.
    pub mercy_pulse: f32,
    pub color_seed: u64,
}

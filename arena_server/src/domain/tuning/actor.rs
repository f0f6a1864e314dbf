// Gameplay tuning for player actors.
//
// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

/// Collision radius of an actor with zero score.
pub const BASE_RADIUS: f32 = 1.0;

/// Score needed to grow the collision radius by one world unit.
pub const SCORE_RADIUS_DIVISOR: f32 = 50.0;

/// Movement and spawn tuning shared by every actor.
#[derive(Debug, Clone, Copy)]
pub struct ActorTuning {
    /// Distance travelled per tick at zero score.
    pub base_speed: f32,

    /// Per-point slowdown factor: `speed = base / (1 + score * slowdown)`.
    pub score_slowdown: f32,

    /// Seconds of collision immunity after spawning.
    pub mercy_seconds: f32,
}

impl Default for ActorTuning {
    fn default() -> Self {
        Self {
            base_speed: 0.5,
            score_slowdown: 0.05,
            mercy_seconds: 3.0,
        }
    }
}

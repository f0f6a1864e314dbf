use crate::domain::actor::Actor;
use crate::domain::state::PlayerInput;
use crate::domain::tuning::actor::ActorTuning;
use crate::domain::world;
use glam::Vec3;

#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    pub base_speed: f32,     // units per tick at zero score
    pub score_slowdown: f32, // per-point drag on speed
}

impl From<&ActorTuning> for MovementConfig {
    fn from(tuning: &ActorTuning) -> Self {
        Self {
            base_speed: tuning.base_speed,
            score_slowdown: tuning.score_slowdown,
        }
    }
}

/// Sum of unit axes for the pressed keys (up is -Z, right is +X). Not normalized.
pub fn raw_direction(input: &PlayerInput) -> Vec3 {
    let mut dir = Vec3::ZERO;
    if input.up {
        dir.z -= 1.0;
    }
    if input.down {
        dir.z += 1.0;
    }
    if input.left {
        dir.x -= 1.0;
    }
    if input.right {
        dir.x += 1.0;
    }
    dir
}

pub fn speed_for_score(score: i32, cfg: MovementConfig) -> f32 {
    cfg.base_speed / (1.0 + score as f32 * cfg.score_slowdown)
}

pub fn tick_actor(actor: &mut Actor, cfg: MovementConfig) {
    let raw = raw_direction(&actor.controller.last_input);
    // No keys held: keep drifting along the last heading.
    if raw != Vec3::ZERO {
        actor.controller.direction = raw.normalize();
    }

    let inset = actor.collision_radius() * 0.5;
    let speed = speed_for_score(actor.score, cfg);
    let next = actor.controller.position + actor.controller.direction * speed;
    actor.controller.position = next.clamp(world::min(inset), world::max(inset));
}

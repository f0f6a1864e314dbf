// Player actor: replicated score/color/mercy state plus its movement controller.

use super::color::Color;
use super::state::{ActorSnapshot, PlayerInput};
use super::tuning::actor::{ActorTuning, BASE_RADIUS, SCORE_RADIUS_DIVISOR};
use super::world;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

// Oscillation rate of the mercy flash, in half-waves over the full mercy window.
const MERCY_FLASH_RATE: f32 = 20.0;
const MERCY_FLASH_GAIN: f32 = 2.0;

/// Authoritative movement state owned by exactly one actor.
#[derive(Debug, Clone, Default)]
pub struct ActorController {
    pub position: Vec3,
    // Last nonzero normalized heading; zero until the first input.
    pub direction: Vec3,
    // Latest received input; persists until a newer record arrives.
    pub last_input: PlayerInput,
}

/// Score transition produced by a single authoritative mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChange {
    pub old: i32,
    pub new: i32,
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: u64,
    pub connection_id: u64,
    pub score: i32,
    pub color_seed: u64,
    pub mercy_time: f32,
    pub controller: ActorController,
}

/// Collision radius for a given score.
pub fn radius_for_score(score: i32) -> f32 {
    BASE_RADIUS + score as f32 / SCORE_RADIUS_DIVISOR
}

impl Actor {
    /// Builds a fresh actor with a random color seed, placed clear of the walls.
    pub fn spawn<R: Rng + ?Sized>(
        id: u64,
        connection_id: u64,
        rng: &mut R,
        tuning: &ActorTuning,
    ) -> Self {
        let color_seed = rng.random::<u64>();
        let position = world::rand_pos(rng, radius_for_score(0), 0.0);
        Self {
            id,
            connection_id,
            score: 0,
            color_seed,
            mercy_time: tuning.mercy_seconds,
            controller: ActorController {
                position,
                ..ActorController::default()
            },
        }
    }

    pub fn position(&self) -> Vec3 {
        self.controller.position
    }

    pub fn collision_radius(&self) -> f32 {
        radius_for_score(self.score)
    }

    pub fn in_mercy(&self) -> bool {
        self.mercy_time > 0.0
    }

    /// Counts the mercy window down by `dt`, clamped at zero. It never re-arms.
    pub fn tick_mercy(&mut self, dt: f32) {
        if self.mercy_time > 0.0 {
            self.mercy_time = (self.mercy_time - dt).max(0.0);
        }
    }

    pub fn add_score(&mut self, points: i32) -> ScoreChange {
        let old = self.score;
        self.score = old.saturating_add(points.max(0));
        ScoreChange {
            old,
            new: self.score,
        }
    }

    /// Three successive draws from a PCG32 stream seeded with `color_seed`.
    pub fn color(&self) -> Color {
        color_from_seed(self.color_seed)
    }

    /// Emission strength of the spawn-protection flash, zero once mercy ends.
    pub fn mercy_pulse(&self, mercy_seconds: f32) -> f32 {
        if !self.in_mercy() || mercy_seconds <= 0.0 {
            return 0.0;
        }
        let progress = self.mercy_time / mercy_seconds;
        (progress * MERCY_FLASH_RATE).sin().abs() * MERCY_FLASH_GAIN
    }

    pub fn snapshot(&self, tuning: &ActorTuning) -> ActorSnapshot {
        ActorSnapshot {
            id: self.id,
            connection_id: self.connection_id,
            position: self.controller.position,
            direction: self.controller.direction,
            score: self.score,
            radius: self.collision_radius(),
            mercy_time: self.mercy_time,
            mercy_pulse: self.mercy_pulse(tuning.mercy_seconds),
            color_seed: self.color_seed,
        }
    }
}

pub fn color_from_seed(seed: u64) -> Color {
    let mut rng = Pcg32::seed_from_u64(seed);
    let r = rng.random::<f32>();
    let g = rng.random::<f32>();
    let b = rng.random::<f32>();
    Color::new(r, g, b)
}

// Authoritative arena: owns the pellet field, live actors and the world RNG,
// and turns each tick into a replicable update.

use super::join::{JoinArbiter, JoinOutcome};
use super::types::{
    ArenaEvent, ArenaStatus, DespawnReason, OwnerState, PelletSnapshot, WorldUpdate,
};
use crate::domain::systems::movement::{self, MovementConfig};
use crate::domain::systems::scoring::{self, CollisionMetric};
use crate::domain::tuning::actor::ActorTuning;
use crate::domain::tuning::pellet::PelletTuning;
use crate::domain::{Actor, PelletField, PlayerInput, Role};
use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct ArenaSettings {
    pub actor: ActorTuning,
    pub pellet: PelletTuning,
    pub collision_metric: CollisionMetric,
}

pub struct Arena {
    settings: ArenaSettings,
    rng: Pcg32,
    // None until world-ready fires.
    role: Option<Role>,
    tick: u64,
    next_actor_id: u64,
    pellets: PelletField,
    actors: Vec<Actor>,
    arbiter: JoinArbiter,
    // Replication outbox drained once per tick.
    events: Vec<ArenaEvent>,
    // connection id -> (actor id, final score) of its last eaten actor.
    eaten: HashMap<u64, (u64, i32)>,
}

impl Arena {
    pub fn new(settings: ArenaSettings, seed: u64) -> Self {
        Self {
            settings,
            rng: Pcg32::seed_from_u64(seed),
            role: None,
            tick: 0,
            next_actor_id: 1,
            pellets: PelletField::new(settings.pellet),
            actors: Vec::new(),
            arbiter: JoinArbiter::new(),
            events: Vec::new(),
            eaten: HashMap::new(),
        }
    }

    /// Lifecycle hook fired once after construction, before the first tick.
    pub fn on_world_ready(&mut self, role: Role) {
        if self.role.is_some() {
            return;
        }
        self.pellets.on_world_ready(role, &mut self.rng);
        self.role = Some(role);
        info!(?role, pellets = self.pellets.len(), "world ready");
    }

    pub fn is_ready(&self) -> bool {
        self.role.is_some()
    }

    fn is_server(&self) -> bool {
        self.role.is_some_and(Role::is_server)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actor_for_connection(&self, connection_id: u64) -> Option<&Actor> {
        let actor_id = self.arbiter.actor_for(connection_id)?;
        self.actors.iter().find(|a| a.id == actor_id)
    }

    pub fn pellets(&self) -> &PelletField {
        &self.pellets
    }

    pub fn pellet_snapshot(&self) -> Vec<Vec3> {
        self.pellets.snapshot()
    }

    /// Pellet positions tagged with the tick they reflect.
    pub fn pellet_sync(&self) -> PelletSnapshot {
        PelletSnapshot {
            tick: self.tick,
            positions: self.pellet_snapshot(),
        }
    }

    pub fn owner_state(&self, connection_id: u64) -> OwnerState {
        if let Some(actor) = self.actor_for_connection(connection_id) {
            return OwnerState::Playing {
                actor_id: actor.id,
                score: actor.score,
                color_seed: actor.color_seed,
            };
        }
        match self.eaten.get(&connection_id) {
            Some(&(actor_id, final_score)) => OwnerState::Eaten {
                actor_id,
                final_score,
            },
            None => OwnerState::Idle,
        }
    }

    pub fn status(&self) -> ArenaStatus {
        ArenaStatus {
            ready: self.is_ready(),
            tick: self.tick,
            actors: self.actors.len(),
            pellets: self.pellets.len(),
        }
    }

    /// Handles a join request; duplicates from a connection with a live actor are no-ops.
    pub fn join(&mut self, connection_id: u64) -> Option<JoinOutcome> {
        if !self.is_server() {
            return None;
        }

        let Self {
            settings,
            rng,
            next_actor_id,
            actors,
            arbiter,
            ..
        } = self;
        let outcome = arbiter.on_join_request(connection_id, actors, || {
            let id = *next_actor_id;
            *next_actor_id += 1;
            Actor::spawn(id, connection_id, rng, &settings.actor)
        });

        match outcome {
            JoinOutcome::Spawned(actor_id) => {
                self.eaten.remove(&connection_id);
                let color_seed = self
                    .actors
                    .iter()
                    .find(|a| a.id == actor_id)
                    .map(|a| a.color_seed)
                    .unwrap_or_default();
                info!(connection_id, actor_id, "actor spawned");
                self.events.push(ArenaEvent::Spawned {
                    actor_id,
                    connection_id,
                    color_seed,
                });
            }
            JoinOutcome::AlreadyPresent(actor_id) => {
                debug!(connection_id, actor_id, "duplicate join ignored");
            }
        }
        Some(outcome)
    }

    /// Drops the connection and despawns its actor, if still alive.
    pub fn leave(&mut self, connection_id: u64) {
        self.eaten.remove(&connection_id);
        let Some(actor_id) = self.arbiter.release(connection_id) else {
            return;
        };
        let Some(index) = self.actors.iter().position(|a| a.id == actor_id) else {
            return;
        };

        let actor = self.actors.remove(index);
        info!(connection_id, actor_id, score = actor.score, "actor left");
        self.events.push(ArenaEvent::Despawned {
            actor_id,
            connection_id,
            final_score: actor.score,
            reason: DespawnReason::Disconnected,
        });
    }

    /// Stores the latest input for the connection's actor; it persists until replaced.
    pub fn apply_input(&mut self, connection_id: u64, input: PlayerInput) {
        let Some(actor_id) = self.arbiter.actor_for(connection_id) else {
            return;
        };
        if let Some(actor) = self.actors.iter_mut().find(|a| a.id == actor_id) {
            actor.controller.last_input = input;
        }
    }

    /// Advances one network tick. Returns `None` until world-ready has fired.
    pub fn tick(&mut self, dt: f32) -> Option<WorldUpdate> {
        if !self.is_ready() {
            return None;
        }
        self.tick += 1;

        // Movement happens-before scoring within the same tick.
        let movement_cfg = MovementConfig::from(&self.settings.actor);
        for actor in &mut self.actors {
            movement::tick_actor(actor, movement_cfg);
            actor.tick_mercy(dt);
        }

        if self.is_server() {
            self.run_scoring();
        }

        Some(WorldUpdate {
            tick: self.tick,
            actors: self
                .actors
                .iter()
                .map(|a| a.snapshot(&self.settings.actor))
                .collect(),
            pellets: self.pellets.take_changes(),
            events: std::mem::take(&mut self.events),
        })
    }

    fn run_scoring(&mut self) {
        let scores_before: HashMap<u64, i32> =
            self.actors.iter().map(|a| (a.id, a.score)).collect();

        let outcome = scoring::run_tick(
            &mut self.actors,
            &mut self.pellets,
            &mut self.rng,
            self.settings.collision_metric,
        );

        for actor in &self.actors {
            let old = scores_before.get(&actor.id).copied().unwrap_or_default();
            if old != actor.score {
                self.events.push(ArenaEvent::ScoreChanged {
                    actor_id: actor.id,
                    connection_id: actor.connection_id,
                    old,
                    new: actor.score,
                });
            }
        }

        for dead in &outcome.despawned {
            let by = outcome
                .collisions
                .iter()
                .find(|c| c.loser_id == dead.id)
                .map(|c| c.survivor_id)
                .unwrap_or_default();
            info!(
                actor_id = dead.id,
                connection_id = dead.connection_id,
                final_score = dead.score,
                eaten_by = by,
                "actor eaten"
            );
            self.eaten.insert(dead.connection_id, (dead.id, dead.score));
            self.events.push(ArenaEvent::Despawned {
                actor_id: dead.id,
                connection_id: dead.connection_id,
                final_score: dead.score,
                reason: DespawnReason::Eaten { by },
            });
        }

        if outcome.pellets_eaten > 0 {
            debug!(tick = self.tick, eaten = outcome.pellets_eaten, "pellets eaten");
        }
    }
}

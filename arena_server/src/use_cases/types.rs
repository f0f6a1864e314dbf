// Use-case level inputs/outputs for the game loop.

use crate::domain::{ActorSnapshot, PelletDelta, PlayerInput};
use glam::Vec3;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum GameEvent {
    Join { connection_id: u64 },
    Leave { connection_id: u64 },
    Input { connection_id: u64, input: PlayerInput },
    // Full pellet field as of the last finished tick.
    SnapshotPellets { reply: oneshot::Sender<PelletSnapshot> },
    // Where the connection's actor stands right now.
    QueryOwner {
        connection_id: u64,
        reply: oneshot::Sender<OwnerState>,
    },
}

/// Every pellet position after tick `tick`. Deltas from later ticks apply on top.
#[derive(Debug, Clone, PartialEq)]
pub struct PelletSnapshot {
    pub tick: u64,
    pub positions: Vec<Vec3>,
}

/// Owner-facing view of a connection's actor, used to resync lost events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerState {
    // Never joined, or left.
    Idle,
    Playing {
        actor_id: u64,
        score: i32,
        color_seed: u64,
    },
    Eaten {
        actor_id: u64,
        final_score: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DespawnReason {
    // Lost a merge against the given actor.
    Eaten { by: u64 },
    Disconnected,
}

/// Replication events published right after the authoritative mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaEvent {
    Spawned {
        actor_id: u64,
        connection_id: u64,
        color_seed: u64,
    },
    ScoreChanged {
        actor_id: u64,
        connection_id: u64,
        old: i32,
        new: i32,
    },
    Despawned {
        actor_id: u64,
        connection_id: u64,
        final_score: i32,
        reason: DespawnReason,
    },
}

impl ArenaEvent {
    pub fn connection_id(&self) -> u64 {
        match self {
            ArenaEvent::Spawned { connection_id, .. }
            | ArenaEvent::ScoreChanged { connection_id, .. }
            | ArenaEvent::Despawned { connection_id, .. } => *connection_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub actors: Vec<ActorSnapshot>,
    pub pellets: PelletDelta,
    pub events: Vec<ArenaEvent>,
}

/// Cheap summary of the arena for health/status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStatus {
    pub ready: bool,
    pub tick: u64,
    pub actors: usize,
    pub pellets: usize,
}

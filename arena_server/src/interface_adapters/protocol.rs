// Wire protocol DTOs and conversions for public arena server messages.

use crate::domain::actor::color_from_seed;
use crate::domain::{ActorSnapshot, PelletDelta, PlayerInput};
use crate::use_cases::{ArenaEvent, ArenaStatus, DespawnReason, PelletSnapshot, WorldUpdate};
use glam::Vec3;
use serde::{Deserialize, Serialize};

fn vec3(v: Vec3) -> [f32; 3] {
    v.to_array()
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Identity assigned to the connection on accept.
    Identity { connection_id: String },
    // Every pellet position; sent once before any deltas.
    PelletSync(PelletSyncDto),
    // Snapshot of actors plus the pellet diff for a given tick.
    WorldUpdate(WorldUpdateDto),
    // The connection's own actor entered the arena.
    Spawned {
        actor_id: String,
        color_seed: String,
        color: [f32; 3],
    },
    // The connection's own score changed.
    ScoreChanged { score: i32 },
    // The connection's own actor was eaten.
    GameOver { score: i32 },
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Request an actor; repeated requests while alive are ignored.
    Join,
    // Latest directional input, sent once per tick.
    Input(PlayerInputDto),
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PlayerInputDto {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

impl From<PlayerInputDto> for PlayerInput {
    fn from(input: PlayerInputDto) -> Self {
        Self {
            up: input.up,
            down: input.down,
            left: input.left,
            right: input.right,
        }
    }
}

/// Whole pellet field after `tick`; replaces whatever the client held.
#[derive(Debug, Clone, Serialize)]
pub struct PelletSyncDto {
    pub tick: u64,
    pub positions: Vec<[f32; 3]>,
}

impl From<&PelletSnapshot> for PelletSyncDto {
    fn from(snapshot: &PelletSnapshot) -> Self {
        Self {
            tick: snapshot.tick,
            positions: snapshot.positions.iter().copied().map(vec3).collect(),
        }
    }
}

/// Changed pellet slots: `indices[i]` now sits at `positions[i]`.
#[derive(Debug, Clone, Serialize)]
pub struct PelletDeltaDto {
    pub length: usize,
    pub indices: Vec<u32>,
    pub positions: Vec<[f32; 3]>,
}

impl From<PelletDelta> for PelletDeltaDto {
    fn from(delta: PelletDelta) -> Self {
        Self {
            length: delta.length,
            indices: delta.indices,
            positions: delta.positions.into_iter().map(vec3).collect(),
        }
    }
}

/// Snapshot of the world sent to clients on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub actors: Vec<ActorStateDto>,
    pub pellets: PelletDeltaDto,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<ArenaEventDto>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            actors: update.actors.iter().map(ActorStateDto::from).collect(),
            pellets: update.pellets.into(),
            events: update
                .events
                .iter()
                .filter_map(ArenaEventDto::from_event)
                .collect(),
        }
    }
}

/// Flattened actor state for wire transmission in world updates.
#[derive(Debug, Clone, Serialize)]
pub struct ActorStateDto {
    pub id: String,
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub score: i32,
    pub radius: f32,
    pub mercy_time: f32,
    pub mercy_pulse: f32,
    pub color: [f32; 3],
}

impl From<&ActorSnapshot> for ActorStateDto {
    fn from(actor: &ActorSnapshot) -> Self {
        Self {
            id: actor.id.to_string(),
            position: vec3(actor.position),
            direction: vec3(actor.direction),
            score: actor.score,
            radius: actor.radius,
            mercy_time: actor.mercy_time,
            mercy_pulse: actor.mercy_pulse,
            color: color_from_seed(actor.color_seed).to_array(),
        }
    }
}

/// Arena lifecycle events visible to every client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum ArenaEventDto {
    Spawned { actor_id: String },
    Despawned { actor_id: String, eaten_by: Option<String> },
}

impl ArenaEventDto {
    /// Public projection of an arena event; score changes stay owner-only.
    pub fn from_event(event: &ArenaEvent) -> Option<Self> {
        match event {
            ArenaEvent::Spawned { actor_id, .. } => Some(ArenaEventDto::Spawned {
                actor_id: actor_id.to_string(),
            }),
            ArenaEvent::ScoreChanged { .. } => None,
            ArenaEvent::Despawned {
                actor_id, reason, ..
            } => Some(ArenaEventDto::Despawned {
                actor_id: actor_id.to_string(),
                eaten_by: match reason {
                    DespawnReason::Eaten { by } => Some(by.to_string()),
                    DespawnReason::Disconnected => None,
                },
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusDto {
    pub ready: bool,
    pub tick: u64,
    pub actors: usize,
    pub pellets: usize,
}

impl From<ArenaStatus> for StatusDto {
    fn from(status: ArenaStatus) -> Self {
        Self {
            ready: status.ready,
            tick: status.tick,
            actors: status.actors,
            pellets: status.pellets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_client_sends_bare_join_then_it_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"Join"}"#).expect("valid join");
        assert!(matches!(msg, ClientMessage::Join));
    }

    #[test]
    fn when_input_omits_keys_then_they_default_to_released() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"Input","data":{"up":true}}"#).expect("valid input");
        let ClientMessage::Input(dto) = msg else {
            panic!("expected input");
        };
        assert_eq!(
            PlayerInput::from(dto),
            PlayerInput {
                up: true,
                ..PlayerInput::default()
            }
        );
    }

    #[test]
    fn when_world_update_is_serialized_then_score_changes_are_filtered_out() {
        let update = WorldUpdate {
            tick: 4,
            actors: Vec::new(),
            pellets: PelletDelta {
                length: 2,
                indices: vec![1],
                positions: vec![Vec3::new(1.0, 0.1, -2.0)],
            },
            events: vec![
                ArenaEvent::ScoreChanged {
                    actor_id: 1,
                    connection_id: 1,
                    old: 0,
                    new: 1,
                },
                ArenaEvent::Despawned {
                    actor_id: 2,
                    connection_id: 2,
                    final_score: 8,
                    reason: DespawnReason::Eaten { by: 1 },
                },
            ],
        };

        let json = serde_json::to_value(ServerMessage::WorldUpdate(update.into()))
            .expect("serializable");

        assert_eq!(json["type"], "WorldUpdate");
        assert_eq!(json["data"]["tick"], 4);
        assert_eq!(json["data"]["pellets"]["indices"], serde_json::json!([1]));
        assert_eq!(
            json["data"]["events"],
            serde_json::json!([{"kind": "Despawned", "actor_id": "2", "eaten_by": "1"}])
        );
    }
}

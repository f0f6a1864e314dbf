// World task: the single owner of the arena, advanced on a fixed interval.

use super::arena::{Arena, ArenaSettings};
use super::types::{ArenaEvent, ArenaStatus, GameEvent, OwnerState, PelletSnapshot, WorldUpdate};
use crate::domain::Role;
use axum::extract::ws::Utf8Bytes;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info};

/// Runtime knobs for spawning the arena world task.
#[derive(Debug, Clone)]
pub struct ArenaRuntime {
    pub settings: ArenaSettings,
    /// Seed for the world RNG (spawns, pellets, color seeds).
    pub seed: u64,
    /// Fixed network tick interval.
    pub tick_interval: Duration,
    pub input_channel_capacity: usize,
    pub world_broadcast_capacity: usize,
    pub event_broadcast_capacity: usize,
}

/// Channels into and out of the running arena.
#[derive(Clone)]
pub struct ArenaHandle {
    /// Sender for game events into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw world updates.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Broadcast sender for serialized world updates.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized world update.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    /// Replication events, filtered per connection by the adapters.
    pub events_tx: broadcast::Sender<ArenaEvent>,
    pub status_tx: watch::Sender<ArenaStatus>,
}

impl ArenaHandle {
    /// Wires the channels and spawns the authoritative world loop.
    pub fn spawn(runtime: ArenaRuntime) -> Self {
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(runtime.input_channel_capacity);
        let (world_tx, _world_rx) =
            broadcast::channel::<WorldUpdate>(runtime.world_broadcast_capacity);
        let (world_bytes_tx, _world_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(runtime.world_broadcast_capacity);
        let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let (events_tx, _events_rx) =
            broadcast::channel::<ArenaEvent>(runtime.event_broadcast_capacity);
        let (status_tx, _status_rx) = watch::channel(ArenaStatus::default());

        tokio::spawn(world_task(
            input_rx,
            world_tx.clone(),
            events_tx.clone(),
            status_tx.clone(),
            runtime,
        ));

        Self {
            input_tx,
            world_tx,
            world_bytes_tx,
            world_latest_tx,
            events_tx,
            status_tx,
        }
    }

    /// Asks the world task for the full pellet field. Answered before the next tick.
    pub async fn pellet_snapshot(&self) -> Option<PelletSnapshot> {
        let (reply, reply_rx) = oneshot::channel();
        self.input_tx
            .send(GameEvent::SnapshotPellets { reply })
            .await
            .ok()?;
        reply_rx.await.ok()
    }

    pub async fn owner_state(&self, connection_id: u64) -> Option<OwnerState> {
        let (reply, reply_rx) = oneshot::channel();
        self.input_tx
            .send(GameEvent::QueryOwner {
                connection_id,
                reply,
            })
            .await
            .ok()?;
        reply_rx.await.ok()
    }
}

pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    events_tx: broadcast::Sender<ArenaEvent>,
    status_tx: watch::Sender<ArenaStatus>,
    runtime: ArenaRuntime,
) {
    let mut arena = Arena::new(runtime.settings, runtime.seed);
    arena.on_world_ready(Role::Server);
    // send_replace stores the value even while nobody is subscribed.
    status_tx.send_replace(arena.status());

    // Drive the fixed-step game loop at the configured tick rate.
    let mut interval = tokio::time::interval(runtime.tick_interval);
    let dt = runtime.tick_interval.as_secs_f32();

    loop {
        interval.tick().await;

        // Inputs that arrived since the last tick apply before movement.
        loop {
            match input_rx.try_recv() {
                Ok(ev) => apply_event(&mut arena, ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!(tick = arena.tick_count(), "input channel closed; world task exiting");
                    return;
                }
            }
        }

        let Some(update) = arena.tick(dt) else {
            continue;
        };

        for event in &update.events {
            let _ = events_tx.send(event.clone());
        }
        status_tx.send_replace(arena.status());
        let _ = world_tx.send(update);
    }
}

fn apply_event(arena: &mut Arena, ev: GameEvent) {
    match ev {
        GameEvent::Join { connection_id } => {
            if arena.join(connection_id).is_none() {
                debug!(connection_id, "join refused; arena not authoritative");
            }
        }
        GameEvent::Leave { connection_id } => arena.leave(connection_id),
        GameEvent::Input {
            connection_id,
            input,
        } => arena.apply_input(connection_id, input),
        GameEvent::SnapshotPellets { reply } => {
            // The requester may have gone away; nothing to do then.
            let _ = reply.send(arena.pellet_sync());
        }
        GameEvent::QueryOwner {
            connection_id,
            reply,
        } => {
            let _ = reply.send(arena.owner_state(connection_id));
        }
    }
}

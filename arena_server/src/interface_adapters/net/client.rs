use crate::domain::PlayerInput;
use crate::domain::actor::color_from_seed;
use crate::interface_adapters::protocol::{
    ClientMessage, PelletSyncDto, ServerMessage, WorldUpdateDto,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_connection_id;
use crate::use_cases::{
    ArenaEvent, ArenaHandle, DespawnReason, GameEvent, OwnerState, WorldUpdate,
};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
    EventsClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Store the latest bytes for lag recovery, subscribed or not.
                world_latest_tx.send_replace(bytes.clone());
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_arena_serializer(arena: &ArenaHandle) {
    tokio::spawn(world_update_serializer(
        arena.world_tx.subscribe(),
        arena.world_bytes_tx.clone(),
        arena.world_latest_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let arena = state.arena.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, arena))
}

async fn handle_socket(mut socket: WebSocket, arena: ArenaHandle) {
    let connection_id = next_connection_id();
    let span = info_span!("conn", connection_id);

    async move {
        let mut ctx = match bootstrap_connection(&mut socket, &arena, connection_id).await {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(error = ?e, "failed to bootstrap connection");
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::ERROR,
                        reason: "bootstrap failed".into(),
                    })))
                    .await;
                let _ = socket.close().await;
                return;
            }
        };

        info!(connection_id, "client connected");

        // Main Client Loop
        if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
            warn!(error = ?e, "client loop exited with error");
        }
    }
    .instrument(span)
    .await
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

/// Fetches the whole pellet field from the world task as a sync message.
async fn pellet_sync_message(arena: &ArenaHandle) -> Result<ServerMessage, NetError> {
    let snapshot = arena
        .pellet_snapshot()
        .await
        .ok_or(NetError::InputClosed)?;
    Ok(ServerMessage::PelletSync(PelletSyncDto::from(&snapshot)))
}

struct ConnCtx {
    pub connection_id: u64,
    pub arena: ArenaHandle,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    pub world_latest_rx: watch::Receiver<Utf8Bytes>,
    pub events_rx: broadcast::Receiver<ArenaEvent>,
    pub owner: OwnerView,
    // Count lag recovery snapshots sent to this client.
    pub lag_recovery_count: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_input_full_log: Instant,
    pub last_world_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    arena: &ArenaHandle,
    connection_id: u64,
) -> Result<ConnCtx, NetError> {
    // Subscribe to updates *before* doing anything else (awaits) to not miss packets.
    let world_bytes_rx = arena.world_bytes_tx.subscribe();
    let world_latest_rx = arena.world_latest_tx.subscribe();
    let events_rx = arena.events_tx.subscribe();

    // Tell the client "This is who you are".
    let identity_msg = ServerMessage::Identity {
        connection_id: connection_id.to_string(),
    };
    let mut bytes_out = send_message(socket, &identity_msg).await? as u64;

    // First sync: the whole pellet field. Deltas queued since subscribing carry
    // absolute positions, so replaying them on top converges.
    let sync_msg = pellet_sync_message(arena).await?;
    bytes_out += send_message(socket, &sync_msg).await? as u64;

    // Back-date the throttles so the first warning of each kind is logged.
    let now = Instant::now()
        .checked_sub(LOG_THROTTLE)
        .unwrap_or_else(Instant::now);
    Ok(ConnCtx {
        connection_id,
        arena: arena.clone(),
        input_tx: arena.input_tx.clone(),
        world_bytes_rx,
        world_latest_rx,
        events_rx,
        owner: OwnerView::default(),
        lag_recovery_count: 0,

        msgs_in: 0,
        msgs_out: 2,
        bytes_in: 0,
        bytes_out,

        invalid_json: 0,

        last_input_full_log: now,
        last_world_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn forward_input(
    connection_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    input: PlayerInput,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match input_tx.try_send(GameEvent::Input {
        connection_id,
        input,
    }) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            // The previous input stays in effect, so dropping one is safe.
            if should_log(last_input_full_log) {
                warn!(connection_id, "input channel full; dropping input");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

fn spawned_message(actor_id: u64, color_seed: u64) -> ServerMessage {
    ServerMessage::Spawned {
        actor_id: actor_id.to_string(),
        color_seed: color_seed.to_string(),
        color: color_from_seed(color_seed).to_array(),
    }
}

/// What this connection has been told about its own actor.
#[derive(Debug, Default)]
struct OwnerView {
    actor_id: Option<u64>,
    game_over: bool,
}

impl OwnerView {
    fn observe(&mut self, event: &ArenaEvent) {
        match *event {
            ArenaEvent::Spawned { actor_id, .. } => {
                self.actor_id = Some(actor_id);
                self.game_over = false;
            }
            ArenaEvent::Despawned {
                actor_id,
                reason: DespawnReason::Eaten { .. },
                ..
            } => {
                self.actor_id = Some(actor_id);
                self.game_over = true;
            }
            _ => {}
        }
    }

    /// Messages that bring the client back in line after owner events were lost.
    fn recover(&mut self, state: OwnerState) -> Vec<ServerMessage> {
        let mut msgs = Vec::new();
        match state {
            OwnerState::Idle => {}
            OwnerState::Playing {
                actor_id,
                score,
                color_seed,
            } => {
                if self.actor_id != Some(actor_id) || self.game_over {
                    msgs.push(spawned_message(actor_id, color_seed));
                    self.actor_id = Some(actor_id);
                    self.game_over = false;
                }
                msgs.push(ServerMessage::ScoreChanged { score });
            }
            OwnerState::Eaten {
                actor_id,
                final_score,
            } => {
                if self.actor_id != Some(actor_id) || !self.game_over {
                    msgs.push(ServerMessage::GameOver { score: final_score });
                    self.actor_id = Some(actor_id);
                    self.game_over = true;
                }
            }
        }
        msgs
    }
}

async fn send_all(
    socket: &mut WebSocket,
    msgs: &[ServerMessage],
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    for msg in msgs {
        match send_message(socket, msg).await {
            Ok(bytes) => {
                *msgs_out += 1;
                *bytes_out += bytes as u64;
            }
            Err(err) => {
                warn!(error = ?err, "failed to send message");
                return LoopControl::Disconnect;
            }
        }
    }
    LoopControl::Continue
}

/// Projects an arena event onto the message its owning connection should see.
fn owner_message(event: &ArenaEvent) -> Option<ServerMessage> {
    match *event {
        ArenaEvent::Spawned {
            actor_id,
            color_seed,
            ..
        } => Some(spawned_message(actor_id, color_seed)),
        ArenaEvent::ScoreChanged { new, .. } => Some(ServerMessage::ScoreChanged { score: new }),
        ArenaEvent::Despawned {
            final_score,
            reason: DespawnReason::Eaten { .. },
            ..
        } => Some(ServerMessage::GameOver { score: final_score }),
        ArenaEvent::Despawned {
            reason: DespawnReason::Disconnected,
            ..
        } => None,
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let connection_id = ctx.connection_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        arena,
        input_tx,
        world_bytes_rx,
        world_latest_rx,
        events_rx,
        owner,
        lag_recovery_count,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_input_full_log,
        last_world_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    connection_id,
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing World Update
            world_msg = world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => match forward_world_bytes(bytes, socket, msgs_out, bytes_out).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_world_lag_log) {
                            warn!(missed = n, "world updates lagged; resyncing pellets");
                        }
                        *lag_recovery_count += 1;

                        // Missed pellet deltas are gone; resend the whole field. Updates
                        // still buffered replay on top of it and converge.
                        match pellet_sync_message(arena).await {
                            Ok(sync) => {
                                match send_all(socket, &[sync], msgs_out, bytes_out).await {
                                    LoopControl::Continue => {
                                        // Actor state is a full snapshot in every update.
                                        let latest = world_latest_rx.borrow().clone();
                                        if latest.is_empty() {
                                            false
                                        } else {
                                            match forward_world_bytes(latest, socket, msgs_out, bytes_out).await {
                                                LoopControl::Continue => false,
                                                LoopControl::Disconnect => true,
                                            }
                                        }
                                    }
                                    LoopControl::Disconnect => true,
                                }
                            }
                            Err(e) => {
                                fatal = Some(e);
                                true
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }

            // Owner-visible replication events
            event = events_rx.recv() => {
                match event {
                    Ok(event) if event.connection_id() == connection_id => {
                        owner.observe(&event);
                        match owner_message(&event) {
                            Some(msg) => matches!(
                                send_all(socket, &[msg], msgs_out, bytes_out).await,
                                LoopControl::Disconnect
                            ),
                            None => false,
                        }
                    }
                    Ok(_) => false,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(
                            connection_id,
                            missed = n,
                            "owner events lagged; resending owner state"
                        );
                        match arena.owner_state(connection_id).await {
                            Some(state) => {
                                let msgs = owner.recover(state);
                                matches!(
                                    send_all(socket, &msgs, msgs_out, bytes_out).await,
                                    LoopControl::Disconnect
                                )
                            }
                            None => {
                                fatal = Some(NetError::InputClosed);
                                true
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::EventsClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(
        connection_id,
        input_tx,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_json,
        *lag_recovery_count,
    )
    .await
    {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    connection_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join) => {
                        // Joins must not be dropped; wait for channel capacity.
                        input_tx
                            .send(GameEvent::Join { connection_id })
                            .await
                            .map_err(|_| NetError::InputClosed)?;
                        Ok(LoopControl::Continue)
                    }
                    Ok(ClientMessage::Input(input)) => {
                        forward_input(connection_id, input_tx, input.into(), last_input_full_log)
                    }
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                connection_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(connection_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(connection_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket
        .send(Message::Text(world_msg))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send world update");
            LoopControl::Disconnect
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    connection_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    lag_recovery_count: u64,
) -> Result<(), NetError> {
    // Despawn whatever actor this connection still owns.
    input_tx
        .send(GameEvent::Leave { connection_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    debug!(
        connection_id,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        lag_recovery_count,
        "connection stats"
    );
    info!(connection_id, "client disconnected");
    Ok(())
}

// Connection identity to live actor mapping. The only path that creates actors.

use crate::domain::Actor;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Spawned(u64),
    AlreadyPresent(u64),
}

impl JoinOutcome {
    pub fn actor_id(self) -> u64 {
        match self {
            JoinOutcome::Spawned(id) | JoinOutcome::AlreadyPresent(id) => id,
        }
    }
}

#[derive(Debug, Default)]
pub struct JoinArbiter {
    // connection id -> actor id; entries may point at destroyed actors.
    players: HashMap<u64, u64>,
}

impl JoinArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns an actor for `connection_id` unless it already has a live one.
    ///
    /// Liveness is judged against `actors`, so a stale entry left behind by a
    /// despawn is replaced rather than reused.
    pub fn on_join_request(
        &mut self,
        connection_id: u64,
        actors: &mut Vec<Actor>,
        spawn: impl FnOnce() -> Actor,
    ) -> JoinOutcome {
        if let Some(&actor_id) = self.players.get(&connection_id) {
            if actors.iter().any(|a| a.id == actor_id) {
                return JoinOutcome::AlreadyPresent(actor_id);
            }
        }

        let actor = spawn();
        let actor_id = actor.id;
        actors.push(actor);
        self.players.insert(connection_id, actor_id);
        JoinOutcome::Spawned(actor_id)
    }

    pub fn actor_for(&self, connection_id: u64) -> Option<u64> {
        self.players.get(&connection_id).copied()
    }

    /// Forgets a connection, returning the actor it last owned.
    pub fn release(&mut self, connection_id: u64) -> Option<u64> {
        self.players.remove(&connection_id)
    }
}

use crate::domain::systems::scoring::CollisionMetric;
use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("ARENA_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn tick_interval() -> Duration {
    let millis = env::var("ARENA_TICK_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .unwrap_or(33);
    Duration::from_millis(millis)
}

/// World RNG seed; a fresh random seed unless pinned for reproducible runs.
pub fn arena_seed() -> u64 {
    env::var("ARENA_SEED")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(rand::random)
}

pub fn collision_metric() -> CollisionMetric {
    match env::var("ARENA_COLLISION_METRIC") {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid ARENA_COLLISION_METRIC; using legacy");
            CollisionMetric::Legacy
        }),
        Err(_) => CollisionMetric::default(),
    }
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;
pub const EVENT_BROADCAST_CAPACITY: usize = 256;

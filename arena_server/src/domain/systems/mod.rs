// Per-tick systems run by the world task.

pub mod movement;
pub mod scoring;

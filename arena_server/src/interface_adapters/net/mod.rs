// Network adapter modules split by client sockets vs HTTP status routes.

pub mod client;
pub mod status;

pub use client::{spawn_arena_serializer, ws_handler};
pub use status::status_handler;

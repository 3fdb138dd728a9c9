//! Core types - pure abstractions shared across the codebase.

mod kind;
mod state;

pub use kind::AssetKind;
pub use state::{is_shutdown, register_server, register_shutdown, setup_shutdown_handler};

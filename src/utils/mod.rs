//! Utility modules shared across tasks and the dev server.

pub mod html;
pub mod mime;
pub mod path;

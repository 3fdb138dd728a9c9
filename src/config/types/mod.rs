//! Configuration utility types.
//!
//! | Module   | Purpose                                      |
//! |----------|----------------------------------------------|
//! | `error`  | Configuration error types                    |
//! | `field`  | Dotted config key paths                      |

mod error;
mod field;

pub use error::ConfigError;
pub use field::FieldPath;

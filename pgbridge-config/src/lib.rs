//! Configuration loading and shared configuration types for the bridge.
//!
//! Configuration is loaded hierarchically: a base file, an environment file
//! (dev/prod), and `APP_`-prefixed environment variable overrides, in that
//! order of precedence.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{LoadConfigError, load_config};

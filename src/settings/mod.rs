//! Configuration comes from an optional TOML file overlaid by environment
//! variables (`DB_USER`, `REDIS_PORTS`, `SECRET_KEY`, ...).
//! See `bin/settings_demo.rs` for a binary printing the resolved values.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;

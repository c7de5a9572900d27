//! Layered settings: a TOML file, then `ROTATOR_*` environment overrides.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;

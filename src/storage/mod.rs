//! # Storage Layer
//!
//! Reading the files pkgorder works from.
//!
//! ## Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Snapshot | JSON or YAML | any path given on the command line |
//! | File groups | JSON or YAML map of name to group | `--groups` |
//! | Project config | TOML | `pkgorder.toml` in the current directory or a parent |
//! | Global config | TOML | `~/.config/pkgorder/config.toml` |
//!
//! ## Key Types
//!
//! - [`Config`] - Project and global configuration
//! - [`Snapshot`] - The package list a graph is built from

mod config;
mod snapshot;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, PROJECT_CONFIG_FILE};
pub use snapshot::{
    load_groups, load_snapshot, parse_snapshot, resolve, resolve_groups, Format, Snapshot,
    SnapshotError,
};

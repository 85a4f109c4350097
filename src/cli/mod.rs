//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `order` | Order a snapshot in one mode (`critical`, `unpack`, `configure`) |
//! | `plan` | Run all three modes, breaking unpack loops |
//! | `check` | Report pre-dependency cycles |
//! | `score` | Show the pre-sort order and score keys |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output on stderr:
//! ```bash
//! pkgorder --verbose plan snapshot.yaml
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod order_cmd;
mod output;
mod plan_cmd;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};

//! clilog-core library.
//!
//! A plain-text note log (one note per line) with a disposable SQLite
//! mirror for querying.
//!
//! - [`codec`] turns log lines into [`model::note::Note`]s and back
//! - [`store`] reads and mutates the log under an advisory lock
//! - [`db`] rebuilds and queries the mirror
//! - [`config`] resolves the data directory and `config.toml`

pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod lock;
pub mod model;
pub mod store;

// # Conventions
//
// - **Errors**: `thiserror` enums per module, each mapping to an
//   `error::ErrorCode`; `anyhow::Result` in the mirror open and query paths.
// - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

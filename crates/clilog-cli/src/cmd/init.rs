//! `clilog init`: create the data directory, an empty log, and the mirror.

use std::fs::OpenOptions;
use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use clilog_core::config;
use clilog_core::db::open_mirror;
use serde::Serialize;
use tracing::info;

use super::Workspace;
use crate::output::{OutputMode, pretty_kv, render};

#[derive(Args, Debug)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
struct InitReport {
    data_dir: String,
    log: String,
    mirror: String,
    created_config: bool,
    created_log: bool,
}

/// Execute `clilog init`. Safe to repeat: nothing existing is overwritten.
///
/// # Errors
///
/// Returns an error if any of the files cannot be created.
pub fn run_init(_args: &InitArgs, ws: &Workspace, output: OutputMode) -> Result<()> {
    let paths = &ws.paths;
    let created_config = config::write_default_config(&paths.data_dir)?;

    if let Some(parent) = paths.log.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let created_log = match OpenOptions::new().write(true).create_new(true).open(&paths.log) {
        Ok(_) => true,
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => false,
        Err(err) => {
            return Err(err).with_context(|| format!("create log {}", paths.log.display()));
        }
    };

    drop(open_mirror(&paths.mirror)?);
    info!(data_dir = %paths.data_dir.display(), created_log, created_config, "initialized");

    let report = InitReport {
        data_dir: paths.data_dir.display().to_string(),
        log: paths.log.display().to_string(),
        mirror: paths.mirror.display().to_string(),
        created_config,
        created_log,
    };

    render(output, &report, |r, w| {
        if r.created_log {
            writeln!(w, "Initialized clilog in {}", r.data_dir)?;
        } else {
            writeln!(w, "clilog already initialized in {}", r.data_dir)?;
        }
        pretty_kv(w, "log", &r.log)?;
        pretty_kv(w, "mirror", &r.mirror)
    })
}

#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clilog_core::error::ErrorCode;
use clilog_core::model::note::Status;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "clilog: a plain-text task log with a queryable SQLite mirror",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides --json and the FORMAT env var).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create the data directory, log, and mirror",
        after_help = "EXAMPLES:\n    # Initialize ~/.clilog (or $CLILOG_DIR)\n    clilog init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Write",
        about = "Append a new note",
        after_help = "EXAMPLES:\n    # Add a note with an inline tag\n    clilog add Buy milk #errand\n\n    # Add explicit tags\n    clilog add Call dentist --tag health"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Read",
        about = "List notes from the log",
        after_help = "EXAMPLES:\n    # Pending notes tagged work\n    clilog list --status pending --tag work\n\n    # Emit machine-readable output\n    clilog list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(next_help_heading = "Read", about = "Show one note")]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Write",
        about = "Replace a note's text",
        after_help = "EXAMPLES:\n    # Reword note 2, keeping its tags\n    clilog edit 2 Buy oat milk"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(next_help_heading = "Write", about = "Mark a note completed")]
    Done(cmd::status::StatusArgs),

    #[command(next_help_heading = "Write", about = "Mark a note pending again")]
    Undo(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Write",
        about = "Delete a note",
        long_about = "Delete a note. Every later note's id shifts down by one."
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(next_help_heading = "Mirror", about = "Rebuild the SQLite mirror from the log")]
    Sync(cmd::sync::SyncArgs),

    #[command(
        next_help_heading = "Mirror",
        about = "Query the SQLite mirror",
        after_help = "EXAMPLES:\n    # Pending bills due by the end of April\n    clilog query --status pending --tag bills --due-before 2024-04-30"
    )]
    Query(cmd::query::QueryArgs),

    #[command(next_help_heading = "Read", about = "Show note counts")]
    Stats(cmd::stats::StatsArgs),

    #[command(next_help_heading = "Read", about = "Export all notes as JSON")]
    Export(cmd::export::ExportArgs),

    #[command(about = "Generate shell completions")]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CLILOG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "clilog=debug,info"
        } else if verbose {
            "clilog=info,warn"
        } else {
            "warn"
        })
    });

    let format = env::var("CLILOG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> Result<(), CliError> {
    if let Commands::Completions(ref args) = cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command)
            .map_err(|e| CliError::from(&e));
    }

    let ws = cmd::Workspace::load()
        .map_err(|e| CliError::coded(ErrorCode::ConfigParseError, format!("{e:#}")))?;

    let result = match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, &ws, output),
        Commands::Add(ref args) => cmd::add::run_add(args, &ws, output),
        Commands::List(ref args) => cmd::list::run_list(args, &ws, output),
        Commands::Show(ref args) => cmd::show::run_show(args, &ws, output),
        Commands::Edit(ref args) => cmd::edit::run_edit(args, &ws, output),
        Commands::Done(ref args) => {
            cmd::status::run_set_status(args, Status::Completed, &ws, output)
        }
        Commands::Undo(ref args) => cmd::status::run_set_status(args, Status::Pending, &ws, output),
        Commands::Delete(ref args) => cmd::delete::run_delete(args, &ws, output),
        Commands::Sync(ref args) => cmd::sync::run_sync(args, &ws, output),
        Commands::Query(ref args) => cmd::query::run_query(args, &ws, output),
        Commands::Stats(ref args) => cmd::stats::run_stats(args, &ws, output),
        Commands::Export(ref args) => cmd::export::run_export(args, &ws),
        Commands::Completions(_) => Ok(()),
    };

    result.map_err(|e| CliError::from(&e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    debug!(?output, "output mode resolved");

    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &err).is_err() {
                eprintln!("error: {}", err.message);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_and_after_subcommand() {
        let cli = Cli::parse_from(["clilog", "--json", "list"]);
        assert!(cli.json);
        let cli = Cli::parse_from(["clilog", "list", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn format_flag_overrides_json() {
        let cli = Cli::parse_from(["clilog", "--json", "--format", "text", "stats"]);
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn done_and_undo_take_an_id() {
        let cli = Cli::parse_from(["clilog", "done", "3"]);
        assert!(matches!(cli.command, Commands::Done(ref a) if a.id == 3));
        let cli = Cli::parse_from(["clilog", "undo", "1"]);
        assert!(matches!(cli.command, Commands::Undo(ref a) if a.id == 1));
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["clilog", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["clilog", "init"],
            vec!["clilog", "add", "Buy", "milk"],
            vec!["clilog", "list"],
            vec!["clilog", "show", "1"],
            vec!["clilog", "edit", "1", "new", "text"],
            vec!["clilog", "done", "1"],
            vec!["clilog", "undo", "1"],
            vec!["clilog", "delete", "1"],
            vec!["clilog", "sync"],
            vec!["clilog", "query", "--tag", "x"],
            vec!["clilog", "stats"],
            vec!["clilog", "export"],
            vec!["clilog", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(
                result.is_ok(),
                "Failed to parse: {:?}: {:?}",
                args,
                result.err()
            );
        }
    }

    #[test]
    fn clap_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}

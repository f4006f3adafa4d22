//! `arc` -- builds and queries a bi-temporal knowledge graph over a
//! repository's commits, pull requests, issues, and decision records.
//!
//! Parses CLI arguments with clap, resolves the runtime context (config
//! root, store path), and dispatches to one of eight command handlers.
//! Carries no business logic of its own: every command is a thin call
//! into `arc-build`/`arc-query`/`arc-ingest`.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use context::RuntimeContext;

/// Exit codes, per the CLI surface this binary implements:
/// 0 success, 1 operational failure, 2 invalid input, 3 remote auth/rate-limit failure.
#[derive(Debug, Clone, Copy)]
#[repr(i32)]
enum ExitCode {
    Success = 0,
    OperationalFailure = 1,
    InvalidInput = 2,
    RemoteAuthFailure = 3,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "debug".to_string() } else { std::env::var("ARC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()) };
    let filter = tracing_subscriber::EnvFilter::new(level);
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).try_init();

    let code = run(cli);
    std::process::exit(code as i32);
}

fn run(cli: Cli) -> ExitCode {
    let Some(command) = cli.command else {
        eprintln!("no command given; run `arc --help` for usage");
        return ExitCode::InvalidInput;
    };

    let repo_path = repo_path_of(&command);
    let ctx = match RuntimeContext::resolve(&cli.global, &repo_path) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::OperationalFailure;
        }
    };

    let result = match command {
        Commands::Build { repo, include, no_post_process } => commands::build::run(&ctx, &repo, include, !no_post_process),
        Commands::Refresh { repo, include } => commands::refresh::run(&ctx, &repo, include),
        Commands::Trace { target } => commands::trace::run(&ctx, target),
        Commands::Why { target } => commands::why::run(&ctx, target),
        Commands::Relate { id, direction, limit } => commands::relate::run(&ctx, &id, direction.into(), limit),
        Commands::Export { sha, out, compress, sign } => commands::export::run(&ctx, &sha, &out, compress, sign),
        Commands::Doctor { repo } => commands::doctor::run(&ctx, &repo),
        Commands::Auth { provider } => commands::auth::run(&ctx, &provider),
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            if !ctx.quiet {
                eprintln!("error: {e}");
            }
            classify(&e)
        }
    }
}

/// Maps a failure to the exit code the CLI surface promises: remote
/// auth/rate-limit failures get their own code so scripts can retry or
/// re-authenticate without parsing stderr.
fn classify(err: &anyhow::Error) -> ExitCode {
    if let Some(arc_err) = err.downcast_ref::<arc_query::ArcError>() {
        return match arc_err {
            arc_query::ArcError::AuthError(_) | arc_query::ArcError::RateLimited { .. } => ExitCode::RemoteAuthFailure,
            arc_query::ArcError::InvalidInput(_) | arc_query::ArcError::NotFound { .. } => ExitCode::InvalidInput,
            _ => ExitCode::OperationalFailure,
        };
    }
    ExitCode::OperationalFailure
}

fn repo_path_of(command: &Commands) -> std::path::PathBuf {
    match command {
        Commands::Build { repo, .. } | Commands::Refresh { repo, .. } | Commands::Doctor { repo } => repo.clone(),
        Commands::Trace { target: cli::TraceTarget::File { repo, .. } } => repo.clone(),
        _ => std::path::PathBuf::from("."),
    }
}

use anyhow::Result;
use batchpush::cli::Cli;
use batchpush::config::parser::validate_config;
use batchpush::git::GitCli;
use batchpush::output::{self, Verbosity, format_duration};
use batchpush::prompt::ask_batch_size;
use batchpush::upload::Uploader;
use batchpush::UploadContext;
use chrono::Local;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use std::io;
use std::num::NonZeroUsize;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `batchpush=debug`
const LOG_ENV: &str = "BATCHPUSH_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    init_tracing(cli.verbose);
    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    let mut ctx = UploadContext::new(cli.dir.clone(), cli.config.clone())?;
    cli.apply_overrides(&mut ctx.config);
    validate_config(&ctx.config)?;

    if let Some(path) = &ctx.config_path {
        output::verbose(&format!("Using configuration {}", path.display()));
    }

    let git = GitCli::new(&ctx.config.git.program, &ctx.work_dir)?;

    let batch_size = match ctx.config.upload.batch_size.and_then(NonZeroUsize::new) {
        Some(size) => size,
        None => ask_batch_size(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    let uploader = Uploader::new(&ctx, &git);

    if cli.dry_run {
        let plan = uploader.plan(batch_size)?;
        if plan.is_empty() {
            output::success("Nothing to upload.");
        }
        for (number, batch) in plan.iter().enumerate() {
            println!("batch {} ({} files)", number + 1, batch.len());
            for path in batch {
                println!("  {path}");
            }
        }
        return Ok(());
    }

    output::info(&format!(
        "Started at {} with {} files per commit",
        Local::now().format("%H:%M:%S"),
        batch_size
    ));

    let summary = uploader.run(batch_size)?;

    output::info(&format!(
        "Committed {} files in {} batches ({})",
        summary.files,
        summary.batches,
        format_duration(summary.elapsed)
    ));

    Ok(())
}

/// Routes `tracing` events to stderr, filtered by `$BATCHPUSH_LOG`
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "batchpush=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

//! xtask for batchpush - build automation and tooling
//!
//! Generates the man page and shell completion scripts from the clap
//! definitions in `batchpush::cli`.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "xtask", about = "Build automation for batchpush")]
enum Task {
    /// Generate the man page from clap definitions
    GenerateManPages {
        /// Output directory for man pages (default: ./man)
        #[arg(short, long, default_value = "man")]
        output: PathBuf,
    },

    /// Generate completion scripts for every supported shell
    GenerateCompletions {
        /// Output directory for completion scripts (default: ./completions)
        #[arg(short, long, default_value = "completions")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    match Task::parse() {
        Task::GenerateManPages { output } => generate_man_pages(&output)?,
        Task::GenerateCompletions { output } => generate_completions(&output)?,
    }

    Ok(())
}

fn generate_man_pages(output_dir: &Path) -> Result<()> {
    println!("Generating man pages...");

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let cmd = batchpush::cli::Cli::command();

    let man_path = output_dir.join("batchpush.1");
    let man_file = fs::File::create(&man_path)
        .with_context(|| format!("Failed to create man page: {}", man_path.display()))?;

    clap_mangen::Man::new(cmd).render(&mut std::io::BufWriter::new(man_file))?;

    println!("✓ Generated: {}", man_path.display());
    println!("\nTo view the man page:");
    println!("  man {}/batchpush.1", output_dir.display());

    Ok(())
}

fn generate_completions(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let mut cmd = batchpush::cli::Cli::command();
    for shell in Shell::value_variants() {
        let path = clap_complete::generate_to(*shell, &mut cmd, "batchpush", output_dir)
            .with_context(|| format!("Failed to generate {shell} completions"))?;
        println!("✓ Generated: {}", path.display());
    }

    Ok(())
}

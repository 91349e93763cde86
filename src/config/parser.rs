use super::Config;
use anyhow::{Context, Result};
use std::path::Path;

pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse TOML config")?;

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.upload.batch_size == Some(0) {
        anyhow::bail!("Batch size must be at least 1");
    }

    if config.upload.max_file_size == 0 {
        anyhow::bail!("Maximum file size must be greater than 0");
    }

    if config.upload.tracker_file.trim().is_empty() {
        anyhow::bail!("Tracker file name cannot be empty");
    }

    if config.upload.commit_message.trim().is_empty() {
        anyhow::bail!("Commit message cannot be empty");
    }

    if config.git.program.trim().is_empty() {
        anyhow::bail!("Git program cannot be empty");
    }

    if config.git.branch.is_some() && config.git.remote.is_none() {
        anyhow::bail!("A push branch requires a remote to be configured");
    }

    Ok(())
}

//! Batch-size input.
//!
//! [`parse_batch_size`] holds all validation; [`ask_batch_size`] is the
//! interactive loop around it and works over any reader/writer pair.

use anyhow::{Context, Result, bail};
use std::fmt;
use std::io::{BufRead, Write};
use std::num::NonZeroUsize;

/// Question shown before reading a batch size
pub const PROMPT: &str = "How many files should be uploaded per commit? ";

/// Why a batch-size answer was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSizeError {
    /// Nothing was typed
    Empty,
    /// The input is not an integer
    NotANumber(String),
    /// The input is zero or negative
    NotPositive(String),
}

impl BatchSizeError {
    /// Message shown before asking again
    #[must_use]
    pub const fn retry_hint(&self) -> &'static str {
        match self {
            Self::Empty | Self::NotANumber(_) => "Please enter a valid number.",
            Self::NotPositive(_) => "Please enter a number greater than 0.",
        }
    }
}

impl fmt::Display for BatchSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no batch size given"),
            Self::NotANumber(input) => write!(f, "'{input}' is not a number"),
            Self::NotPositive(input) => write!(f, "batch size must be greater than 0, got {input}"),
        }
    }
}

impl std::error::Error for BatchSizeError {}

/// Validates one line of input as a batch size
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns a [`BatchSizeError`] for empty, non-integer, zero or negative input
pub fn parse_batch_size(input: &str) -> std::result::Result<NonZeroUsize, BatchSizeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(BatchSizeError::Empty);
    }

    match trimmed.parse::<i128>() {
        Ok(n) if n <= 0 => Err(BatchSizeError::NotPositive(trimmed.to_string())),
        Ok(n) => usize::try_from(n)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| BatchSizeError::NotANumber(trimmed.to_string())),
        Err(_) => Err(BatchSizeError::NotANumber(trimmed.to_string())),
    }
}

/// Asks for a batch size until a valid one is entered
///
/// # Errors
///
/// Returns an error if reading or writing fails, or if input ends before a
/// valid answer was given
pub fn ask_batch_size<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<NonZeroUsize> {
    let mut line = String::new();

    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        line.clear();
        let read = input
            .read_line(&mut line)
            .context("Failed to read batch size")?;
        if read == 0 {
            bail!("Input closed before a batch size was entered");
        }

        match parse_batch_size(&line) {
            Ok(size) => return Ok(size),
            Err(err) => {
                tracing::debug!(error = %err, "Rejected batch size");
                writeln!(output, "{}", err.retry_hint())?;
            }
        }
    }
}

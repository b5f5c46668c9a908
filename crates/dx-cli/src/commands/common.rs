//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use dx_core::Config;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::cli::GlobalArgs;

/// Input argument that reads standard input
pub(crate) const STDIN: &str = "-";

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs maps it to the process status silently
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load `--config` when given, otherwise `dialectic.yml` from the working
/// directory, otherwise defaults.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path)),
        None => Config::load_from_dir(Path::new("."))
            .context("Failed to load dialectic.yml from the current directory"),
    }
}

/// Expand input arguments into concrete paths.
///
/// Arguments containing glob metacharacters are expanded and sorted; a
/// pattern that matches nothing is an error. `-` passes through untouched.
pub(crate) fn expand_inputs(inputs: &[String]) -> Result<Vec<String>> {
    let mut expanded = Vec::new();
    for input in inputs {
        if input == STDIN || !is_glob_pattern(input) {
            expanded.push(input.clone());
            continue;
        }
        let mut matches: Vec<PathBuf> = glob::glob(input)
            .with_context(|| format!("Invalid glob pattern '{}'", input))?
            .collect::<Result<_, _>>()
            .with_context(|| format!("Failed to expand '{}'", input))?;
        if matches.is_empty() {
            anyhow::bail!("No files match '{}'", input);
        }
        matches.sort();
        expanded.extend(matches.into_iter().map(|p| p.display().to_string()));
    }

    let stdin_count = expanded.iter().filter(|i| i.as_str() == STDIN).count();
    if stdin_count > 1 {
        anyhow::bail!("'-' (stdin) can be given only once");
    }
    Ok(expanded)
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Read a file, or standard input for `-`
pub(crate) async fn read_input(input: &str) -> Result<String> {
    if input == STDIN {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read standard input")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input))
}

/// Path the converted form of `input` is written to under `out_dir`
pub(crate) fn output_path(out_dir: &Path, input: &str) -> PathBuf {
    let name = if input == STDIN {
        "stdin.sql".to_string()
    } else {
        Path::new(input)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output.sql".to_string())
    };
    out_dir.join(name)
}

/// Output path of every input, failing when two inputs would write the same file
pub(crate) fn output_paths(out_dir: &Path, inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut claimed: HashMap<PathBuf, &str> = HashMap::new();
    let mut paths = Vec::with_capacity(inputs.len());
    for input in inputs {
        let path = output_path(out_dir, input);
        if let Some(previous) = claimed.insert(path.clone(), input) {
            anyhow::bail!(
                "'{}' and '{}' would both be written to {}; convert them in separate runs",
                previous,
                input,
                path.display()
            );
        }
        paths.push(path);
    }
    Ok(paths)
}

/// Shorten text for one-line display
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let single_line: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars).collect();
    format!("{}...", cut)
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;

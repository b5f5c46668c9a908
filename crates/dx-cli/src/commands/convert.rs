//! Convert command implementation

use anyhow::{Context, Result};
use dx_engine::{ConversionResult, Coordinator, StatsSnapshot};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::cli::{ConvertArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{self, ExitCode};

/// Outcome of converting one input
#[derive(Debug, Serialize)]
struct FileReport {
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    written_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ConversionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    io_error: Option<String>,
}

impl FileReport {
    fn succeeded(&self) -> bool {
        self.io_error.is_none() && self.result.as_ref().is_some_and(|r| r.success)
    }
}

/// JSON document printed for `--output json`
#[derive(Debug, Serialize)]
struct ConvertOutput<'a> {
    files: &'a [FileReport],
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<StatsSnapshot>,
}

/// Settings shared by every file of one run
struct RunSettings<'a> {
    source: &'a str,
    target: &'a str,
    pretty: bool,
}

/// Execute the convert command
pub(crate) async fn execute(args: &ConvertArgs, global: &GlobalArgs) -> Result<()> {
    if args.threads == 0 {
        anyhow::bail!("--threads must be at least 1");
    }
    let config = common::load_config(global)?;
    let inputs = common::expand_inputs(&args.inputs)?;
    let pretty = config.conversion.pretty_print && !args.no_pretty;

    let service = dx_infer::service_from_config(&config.inference, args.api_key.as_deref())
        .context("Failed to set up the inference service")?;
    let coordinator =
        Coordinator::new(config, service).context("Failed to create the coordinator")?;

    let targets: Vec<Option<PathBuf>> = match &args.out_dir {
        Some(dir) => {
            let dir = PathBuf::from(dir);
            let paths = common::output_paths(&dir, &inputs)?;
            tokio::fs::create_dir_all(&dir).await.with_context(|| {
                format!("Failed to create output directory {}", dir.display())
            })?;
            paths.into_iter().map(Some).collect()
        }
        None => vec![None; inputs.len()],
    };

    if inputs.len() > 1 {
        coordinator.warm_up().await;
    }

    let cancel = CancellationToken::new();
    let interrupt = spawn_interrupt_watcher(cancel.clone());

    let settings = RunSettings {
        source: &args.from,
        target: &args.to,
        pretty,
    };

    let progress = if args.output == OutputFormat::Text && inputs.len() > 1 {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let reports: Vec<FileReport> = stream::iter(inputs.iter().zip(&targets))
        .map(|(input, target)| {
            let coordinator = &coordinator;
            let settings = &settings;
            let cancel = &cancel;
            let progress = progress.as_ref();
            async move {
                let report =
                    convert_file(coordinator, input, target.as_deref(), settings, cancel).await;
                if let Some(pb) = progress {
                    pb.set_message(format!("Converted: {}", input));
                    pb.inc(1);
                }
                report
            }
        })
        .buffered(args.threads)
        .collect()
        .await;

    interrupt.abort();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let stats = args.stats.then(|| coordinator.stats().snapshot());
    match args.output {
        OutputFormat::Json => print_json(&reports, stats)?,
        OutputFormat::Text => print_text(&reports, stats.as_ref()),
    }

    let failures = reports.iter().filter(|r| !r.succeeded()).count();
    if failures > 0 {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

/// Cancel in-flight conversions on Ctrl-C
fn spawn_interrupt_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling remaining conversions");
            cancel.cancel();
        }
    })
}

async fn convert_file(
    coordinator: &Coordinator,
    input: &str,
    target: Option<&Path>,
    settings: &RunSettings<'_>,
    cancel: &CancellationToken,
) -> FileReport {
    let mut report = FileReport {
        input: input.to_string(),
        written_to: None,
        result: None,
        io_error: None,
    };

    let text = match common::read_input(input).await {
        Ok(text) => text,
        Err(e) => {
            report.io_error = Some(format!("{:#}", e));
            return report;
        }
    };

    log::debug!("Converting {} ({} bytes)", input, text.len());
    let result = coordinator
        .convert_document_with_cancel(
            &text,
            settings.source,
            settings.target,
            settings.pretty,
            cancel,
        )
        .await;

    if let (Some(path), true) = (target, result.success) {
        match write_output(path, &result.result_text).await {
            Ok(()) => report.written_to = Some(path.display().to_string()),
            Err(e) => report.io_error = Some(format!("{:#}", e)),
        }
    }

    report.result = Some(result);
    report
}

async fn write_output(path: &Path, text: &str) -> Result<()> {
    let mut content = text.to_string();
    if !content.ends_with('\n') {
        content.push('\n');
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn print_json(reports: &[FileReport], stats: Option<StatsSnapshot>) -> Result<()> {
    let output = ConvertOutput {
        files: reports,
        stats,
    };
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize results")?;
    println!("{}", json);
    Ok(())
}

fn print_text(reports: &[FileReport], stats: Option<&StatsSnapshot>) {
    let with_headers = reports.len() > 1;

    for report in reports {
        if let Some(err) = &report.io_error {
            eprintln!("[error] {}: {}", report.input, err);
        }
        let Some(result) = &report.result else {
            continue;
        };

        for warning in &result.warnings {
            eprintln!("[warn] {}: {}", report.input, warning);
        }

        if let Some(error) = &result.error {
            eprintln!(
                "[error] {}: {} [{}] {}",
                report.input, error.category, error.code, error.message
            );
            continue;
        }

        match &report.written_to {
            Some(path) => println!(
                "  [ok] {} -> {} ({}, {}ms)",
                report.input, path, result.strategy, result.metadata.duration_ms
            ),
            None if report.io_error.is_none() => {
                if with_headers {
                    println!(
                        "-- {} ({}, {}ms)",
                        report.input, result.strategy, result.metadata.duration_ms
                    );
                }
                println!("{}", result.result_text.trim_end());
                if with_headers {
                    println!();
                }
            }
            None => {}
        }
    }

    if with_headers {
        let succeeded = reports.iter().filter(|r| r.succeeded()).count();
        println!("Converted {} of {} documents", succeeded, reports.len());
    }

    if let Some(stats) = stats {
        print_stats(stats);
    }
}

fn print_stats(stats: &StatsSnapshot) {
    println!();
    println!("Conversion statistics:");
    println!(
        "  documents:        {} ({} succeeded, {} failed)",
        stats.total, stats.succeeded, stats.failed
    );
    println!("  success rate:     {:.1}%", stats.success_rate * 100.0);
    println!(
        "  rule-based:       {} ({:.1}%)",
        stats.rule_based,
        stats.rule_based_rate * 100.0
    );
    println!(
        "  hybrid:           {} ({:.1}%)",
        stats.hybrid,
        stats.hybrid_rate * 100.0
    );
    println!(
        "  generative:       {} ({:.1}%)",
        stats.generative,
        stats.generative_rate * 100.0
    );
    println!("  error recoveries: {}", stats.error_recoveries);
    println!("  cache hits:       {}", stats.cache_hits);
    println!("  average duration: {:.1}ms", stats.average_duration_ms);
}

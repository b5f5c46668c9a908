//! Segment command implementation

use anyhow::{Context, Result};
use dx_core::{Piece, RegionKind, RegionMatcher, Segmentation};
use dx_engine::preprocess::preprocess;
use serde::Serialize;

use crate::cli::{GlobalArgs, OutputFormat, SegmentArgs};
use crate::commands::common;

const PREVIEW_CHARS: usize = 60;

/// One piece of the segmented document, for JSON output
#[derive(Debug, Serialize)]
struct PieceReport<'a> {
    piece: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<RegionKind>,
    start: usize,
    end: usize,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SegmentOutput<'a> {
    wrappers: &'a [String],
    whole_document: bool,
    unit_count: usize,
    pieces: Vec<PieceReport<'a>>,
}

/// Execute the segment command
pub(crate) async fn execute(args: &SegmentArgs, global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    let wrappers = args
        .wrappers
        .clone()
        .unwrap_or(config.conversion.dynamic_wrappers);
    let matcher = RegionMatcher::new(&wrappers).context("Invalid dynamic-SQL wrapper list")?;

    let text = preprocess(&common::read_input(&args.input).await?);
    let segmentation = matcher.segment(&text);

    match args.output {
        OutputFormat::Json => {
            let output = SegmentOutput {
                wrappers: matcher.wrappers(),
                whole_document: segmentation.whole_document,
                unit_count: segmentation.units().count(),
                pieces: piece_reports(&segmentation, &text),
            };
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialize segments")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text(&segmentation, &text),
    }
    Ok(())
}

fn piece_reports<'a>(segmentation: &'a Segmentation, text: &'a str) -> Vec<PieceReport<'a>> {
    segmentation
        .pieces
        .iter()
        .map(|piece| match piece {
            Piece::Verbatim { start, end } => PieceReport {
                piece: "verbatim",
                kind: None,
                start: *start,
                end: *end,
                text: &text[*start..*end],
            },
            Piece::Unit(region) => PieceReport {
                piece: "unit",
                kind: Some(region.kind),
                start: region.start,
                end: region.end,
                text: &region.text,
            },
        })
        .collect()
}

fn print_text(segmentation: &Segmentation, text: &str) {
    let units: Vec<_> = segmentation.units().collect();
    if units.is_empty() {
        println!("No conversion units found.");
        return;
    }

    println!(
        "{} unit(s){}",
        units.len(),
        if segmentation.whole_document {
            ", whole document is one procedural block"
        } else {
            ""
        }
    );
    println!();
    println!("{:<4} {:<17} {:<14} PREVIEW", "#", "KIND", "SPAN");
    for (index, region) in units.iter().enumerate() {
        println!(
            "{:<4} {:<17} {:<14} {}",
            index,
            region.kind.as_str(),
            format!("{}..{}", region.start, region.end),
            common::preview(&region.text, PREVIEW_CHARS)
        );
    }

    let verbatim = segmentation.pieces.len() - units.len();
    if verbatim > 0 {
        println!();
        println!(
            "{} verbatim piece(s) copied unchanged ({} of {} bytes)",
            verbatim,
            verbatim_bytes(segmentation),
            text.len()
        );
    }
}

fn verbatim_bytes(segmentation: &Segmentation) -> usize {
    segmentation
        .pieces
        .iter()
        .map(|piece| match piece {
            Piece::Verbatim { start, end } => end - start,
            Piece::Unit(_) => 0,
        })
        .sum()
}

//! Analyze command implementation

use anyhow::{Context, Result};
use dx_core::{
    ComplexityAnalyzer, ComplexityReport, Dialect, Region, RegionKind, RegionMatcher, Strategy,
    StrategySelector,
};
use dx_engine::preprocess::preprocess;
use serde::Serialize;

use crate::cli::{AnalyzeArgs, GlobalArgs, OutputFormat};
use crate::commands::common;

const PREVIEW_CHARS: usize = 50;

/// Per-unit scoring, for output
#[derive(Debug, Serialize)]
struct UnitAnalysis {
    index: usize,
    kind: RegionKind,
    start: usize,
    end: usize,
    complexity: u8,
    /// None for comment blocks, which only convert the dynamic calls inside them
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<Strategy>,
    #[serde(skip)]
    preview: String,
}

#[derive(Debug, Serialize)]
struct AnalyzeOutput {
    source: Dialect,
    target: Dialect,
    hard_pair: bool,
    document: ComplexityReport,
    document_strategy: Strategy,
    whole_document: bool,
    units: Vec<UnitAnalysis>,
}

/// Execute the analyze command
pub(crate) async fn execute(args: &AnalyzeArgs, global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    let source = Dialect::parse_name(&args.from)?;
    let target = Dialect::parse_name(&args.to)?;

    let matcher = RegionMatcher::new(&config.conversion.dynamic_wrappers)
        .context("Invalid dynamic-SQL wrapper list")?;
    let analyzer = ComplexityAnalyzer::new(matcher.clone());
    let selector = StrategySelector::from_config(&config);

    let text = preprocess(&common::read_input(&args.input).await?);
    let document = analyzer.analyze(&text);
    let document_strategy =
        selector.select(source, target, document.score, document.has_procedural);

    let segmentation = matcher.segment(&text);
    let units = segmentation
        .units()
        .enumerate()
        .map(|(index, region)| {
            analyze_unit(index, region, source, target, &matcher, &analyzer, &selector)
        })
        .collect();

    let output = AnalyzeOutput {
        source,
        target,
        hard_pair: selector.is_hard_pair(source, target),
        document,
        document_strategy,
        whole_document: segmentation.whole_document,
        units,
    };

    match args.output {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialize analysis")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text(&output),
    }
    Ok(())
}

fn analyze_unit(
    index: usize,
    region: &Region,
    source: Dialect,
    target: Dialect,
    matcher: &RegionMatcher,
    analyzer: &ComplexityAnalyzer,
    selector: &StrategySelector,
) -> UnitAnalysis {
    let complexity = analyzer.score(&region.text);
    let strategy = match region.kind {
        RegionKind::Plain => Some(selector.select(source, target, complexity, false)),
        RegionKind::ProceduralBlock => Some(selector.select(source, target, complexity, true)),
        RegionKind::DynamicCall => {
            // The wrapped SQL is what gets converted
            let inner_score = matcher
                .parse_dynamic_call(&region.text)
                .map(|call| analyzer.score(&call.inner))
                .unwrap_or(complexity);
            Some(selector.select(source, target, inner_score, false))
        }
        RegionKind::CommentBlock => None,
    };

    UnitAnalysis {
        index,
        kind: region.kind,
        start: region.start,
        end: region.end,
        complexity,
        strategy,
        preview: common::preview(&region.text, PREVIEW_CHARS),
    }
}

fn print_text(output: &AnalyzeOutput) {
    let doc = &output.document;
    println!(
        "{} -> {}{}",
        output.source.display_name(),
        output.target.display_name(),
        if output.hard_pair {
            " (procedural code needs generative conversion)"
        } else {
            ""
        }
    );
    println!();
    println!("Document complexity: {}", doc.score);
    println!("  lines:              {}", doc.line_count);
    println!("  selects:            {}", doc.select_count);
    println!("  joins:              {}", doc.join_count);
    println!("  procedural:         {}", yes_no(doc.has_procedural));
    println!("  dynamic calls:      {}", yes_no(doc.has_dynamic_call));
    println!("  window functions:   {}", yes_no(doc.has_window_function));
    println!("  recursive CTE:      {}", yes_no(doc.has_recursive_cte));
    println!("  hierarchical query: {}", yes_no(doc.has_hierarchical_query));
    println!("  comments:           {}", yes_no(doc.has_comments));
    println!("Document strategy:   {}", output.document_strategy);
    println!();

    if output.units.is_empty() {
        println!("No conversion units found.");
        return;
    }

    println!(
        "{:<4} {:<17} {:>5}  {:<12} PREVIEW",
        "#", "KIND", "SCORE", "STRATEGY"
    );
    for unit in &output.units {
        println!(
            "{:<4} {:<17} {:>5}  {:<12} {}",
            unit.index,
            unit.kind.as_str(),
            unit.complexity,
            unit.strategy.map_or("-", |s| s.as_str()),
            unit.preview
        );
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

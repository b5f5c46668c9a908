//! Conversion Coordinator
//!
//! [`Coordinator::convert_document`] runs the whole pipeline for one
//! document: validate the request, preprocess, segment, dispatch every unit
//! to the strategy the selector picks, reassemble in document order,
//! postprocess and validate the result. A dispatch failure gets one
//! error-recovery attempt on the original input before it is reported.
//!
//! Dynamic calls, commented dynamic calls and procedure bodies are converted
//! by running the same pipeline over their inner text.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use dx_core::{
    ComplexityAnalyzer, Config, Dialect, Piece, Region, RegionKind, RegionMatcher, Strategy,
    StrategySelector,
};
use dx_infer::service::truncate;
use dx_infer::{
    ConversionCache, GenerativeAdapter, GenerativeOutput, GenerativeRequest, InferenceService,
    PromptKind, Sleeper,
};
use dx_sql::{
    supports_structural_rewrite, validate_result, OracleProcedure, RuleEngine, SqlparserEngine,
};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ConvertError, ConvertResult};
use crate::preprocess::{collapse_blank_lines, harmonize_terminator, preprocess};
use crate::result::{
    document_strategy, ConversionMetadata, ConversionResult, UnitOutcome, UnitReport,
};
use crate::stats::ConversionStats;

/// Warning attached to results rescued by the error-recovery prompt
pub const RECOVERED_WARNING: &str = "recovered via error-recovery prompt";

const WARM_UP_SQL: &str = "SELECT 1 AS warm_up";

/// Characters of SQL shown in info-level logs
const LOG_PREVIEW: usize = 60;

/// Composes segmentation, strategy selection and both converters.
///
/// One coordinator is built at start-up and shared; its cache and stats are
/// the only state that outlives a conversion.
pub struct Coordinator {
    config: Config,
    matcher: RegionMatcher,
    analyzer: ComplexityAnalyzer,
    selector: StrategySelector,
    engine: Arc<dyn RuleEngine>,
    generative: GenerativeAdapter,
    stats: Arc<ConversionStats>,
}

/// Converted text of one segmented text
struct TextConversion {
    text: String,
    units: Vec<UnitReport>,
    warnings: Vec<String>,
    whole_document: bool,
}

struct UnitConversion {
    text: String,
    report: UnitReport,
    warnings: Vec<String>,
}

/// What a converter produced for one unit
struct Dispatched {
    text: String,
    strategy: Strategy,
    outcome: UnitOutcome,
    prompt: Option<PromptKind>,
    cache_hit: bool,
}

impl Dispatched {
    fn rule_based(text: String, strategy: Strategy, outcome: UnitOutcome) -> Self {
        Self {
            text,
            strategy,
            outcome,
            prompt: None,
            cache_hit: false,
        }
    }

    fn generative(output: GenerativeOutput, strategy: Strategy, outcome: UnitOutcome) -> Self {
        Self {
            text: output.text,
            strategy,
            outcome,
            prompt: output.prompt,
            cache_hit: output.cache_hit,
        }
    }

    /// Summarise a recursively converted text.
    ///
    /// The strategy is the most inferential of `floor` and the inner units.
    /// Without a fixed `outcome` the dominant inner unit's outcome is used,
    /// or passthrough when there were no inner units.
    fn nested(
        text: String,
        floor: Strategy,
        outcome: Option<UnitOutcome>,
        inner: &[UnitReport],
    ) -> Self {
        let dominant = inner.iter().max_by_key(|u| u.strategy.rank());
        let strategy = match dominant {
            Some(u) if u.strategy.rank() > floor.rank() => u.strategy,
            _ => floor,
        };
        Self {
            text,
            strategy,
            outcome: outcome
                .or_else(|| dominant.map(|u| u.outcome))
                .unwrap_or(UnitOutcome::Passthrough),
            prompt: dominant.and_then(|u| u.prompt),
            cache_hit: inner.iter().any(|u| u.cache_hit),
        }
    }
}

impl Coordinator {
    /// Build a coordinator with its own cache and stats
    pub fn new(config: Config, service: Arc<dyn InferenceService>) -> ConvertResult<Self> {
        let cache = Arc::new(ConversionCache::new(&config.cache));
        Self::with_shared(config, service, cache, Arc::new(ConversionStats::new()))
    }

    /// Build a coordinator around an existing cache and stats instance
    pub fn with_shared(
        config: Config,
        service: Arc<dyn InferenceService>,
        cache: Arc<ConversionCache>,
        stats: Arc<ConversionStats>,
    ) -> ConvertResult<Self> {
        config.validate()?;
        let matcher = RegionMatcher::new(&config.conversion.dynamic_wrappers)?;
        let generative = GenerativeAdapter::new(&config, service, cache)?;
        log::debug!(
            "Coordinator ready (inference service: {}, wrappers: {:?})",
            generative.service_name(),
            matcher.wrappers()
        );
        Ok(Self {
            analyzer: ComplexityAnalyzer::new(matcher.clone()),
            selector: StrategySelector::from_config(&config),
            matcher,
            engine: Arc::new(SqlparserEngine::new()),
            generative,
            stats,
            config,
        })
    }

    /// Replace the rule-based engine
    pub fn with_rule_engine(mut self, engine: Arc<dyn RuleEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Replace the sleeper used for inference backoff
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.generative = self.generative.with_sleeper(sleeper);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn matcher(&self) -> &RegionMatcher {
        &self.matcher
    }

    pub fn analyzer(&self) -> &ComplexityAnalyzer {
        &self.analyzer
    }

    pub fn selector(&self) -> &StrategySelector {
        &self.selector
    }

    pub fn stats(&self) -> &Arc<ConversionStats> {
        &self.stats
    }

    pub fn cache(&self) -> &Arc<ConversionCache> {
        self.generative.cache()
    }

    /// Convert `document` from the `source` to the `target` dialect
    pub async fn convert_document(
        &self,
        document: &str,
        source: &str,
        target: &str,
        pretty: bool,
    ) -> ConversionResult {
        self.convert_document_with_cancel(
            document,
            source,
            target,
            pretty,
            &CancellationToken::new(),
        )
        .await
    }

    /// [`Coordinator::convert_document`] that stops when `cancel` fires.
    ///
    /// No unit is dispatched and no inference retry starts after
    /// cancellation; the result then fails with category Cancelled.
    pub async fn convert_document_with_cancel(
        &self,
        document: &str,
        source: &str,
        target: &str,
        pretty: bool,
        cancel: &CancellationToken,
    ) -> ConversionResult {
        let result = self.run(document, source, target, pretty, cancel).await;
        self.stats.record(&result);
        result
    }

    /// Run a trivial conversion so connection problems show up early.
    ///
    /// The outcome is logged and not counted in the stats.
    pub async fn warm_up(&self) {
        let result = self
            .run(WARM_UP_SQL, "mysql", "postgres", false, &CancellationToken::new())
            .await;
        match &result.error {
            None => log::info!(
                "Warm-up conversion succeeded in {}ms",
                result.metadata.duration_ms
            ),
            Some(error) => log::warn!("Warm-up conversion failed: {}", error.message),
        }
    }

    async fn run(
        &self,
        document: &str,
        source: &str,
        target: &str,
        pretty: bool,
        cancel: &CancellationToken,
    ) -> ConversionResult {
        let started = Instant::now();
        let mut metadata = ConversionMetadata::new(Uuid::new_v4().to_string(), Utc::now());
        let mut warnings = Vec::new();

        let (source, target) = match validate_request(document, source, target) {
            Ok(pair) => pair,
            Err(err) => {
                log::warn!("Rejected conversion request: {}", err);
                metadata.duration_ms = elapsed_ms(started);
                return ConversionResult::failed(&err, Strategy::RuleBased, warnings, metadata);
            }
        };
        metadata.source = Some(source);
        metadata.target = Some(target);
        if source == target {
            warnings.push(format!(
                "source and target dialect are both {}; output is only normalised",
                source
            ));
        }

        let text = preprocess(document);
        metadata.complexity = self.analyzer.score(&text);
        log::info!(
            "Converting {} -> {} (complexity {}): {}",
            source,
            target,
            metadata.complexity,
            truncate(text.trim(), LOG_PREVIEW)
        );

        let (converted, strategy) = match self
            .convert_text(&text, source, target, pretty, cancel)
            .await
        {
            Ok(conversion) => {
                metadata.whole_document = conversion.whole_document;
                metadata.cache_hit = conversion.units.iter().any(|u| u.cache_hit);
                warnings.extend(conversion.warnings);
                let strategy = document_strategy(&conversion.units);
                metadata.units = conversion.units;
                (conversion.text, strategy)
            }
            Err(err) => match self
                .recover(document, source, target, &err, &mut warnings, cancel)
                .await
            {
                Some(recovered) => {
                    metadata.error_recovered = true;
                    warnings.push(format!("{} ({})", RECOVERED_WARNING, err));
                    (harmonize_terminator(&recovered, &text), Strategy::Generative)
                }
                None => {
                    log::warn!("Conversion {} failed: {}", metadata.conversion_id, err);
                    metadata.duration_ms = elapsed_ms(started);
                    return ConversionResult::failed(&err, Strategy::RuleBased, warnings, metadata);
                }
            },
        };

        let result_text = collapse_blank_lines(&converted);
        warnings.extend(validate_result(&result_text, target));
        metadata.duration_ms = elapsed_ms(started);
        log::info!(
            "Converted {} -> {} with {} strategy in {}ms ({} warning(s))",
            source,
            target,
            strategy,
            metadata.duration_ms,
            warnings.len()
        );
        ConversionResult::succeeded(result_text, strategy, warnings, metadata)
    }

    /// One error-recovery attempt on the whole original input
    async fn recover(
        &self,
        document: &str,
        source: Dialect,
        target: Dialect,
        err: &ConvertError,
        warnings: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> Option<String> {
        if !self.config.conversion.fallback_enabled || !err.is_recoverable() {
            return None;
        }
        log::warn!("Conversion failed ({}); trying the error-recovery prompt", err);
        match self
            .generative
            .recover(document, source, target, &err.to_string(), cancel)
            .await
        {
            Ok(output) => Some(output.text),
            Err(recovery_err) => {
                log::warn!("Error recovery failed: {}", recovery_err);
                warnings.push(format!("error recovery failed: {}", recovery_err));
                None
            }
        }
    }

    /// Segment `text`, convert its units and reassemble in document order
    fn convert_text<'a>(
        &'a self,
        text: &'a str,
        source: Dialect,
        target: Dialect,
        pretty: bool,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, ConvertResult<TextConversion>> {
        async move {
            let segmentation = self.matcher.segment(text);
            if segmentation.whole_document {
                log::debug!("Converting the whole text as one procedural block");
            }

            let unit_futures: Vec<_> = segmentation
                .units()
                .enumerate()
                .map(|(index, region)| {
                    self.convert_unit(index, region, source, target, pretty, cancel)
                })
                .collect();
            let converted: Vec<UnitConversion> = stream::iter(unit_futures)
                .buffered(self.config.conversion.max_concurrent_units)
                .try_collect()
                .await?;

            let mut out = String::with_capacity(text.len());
            let mut units = Vec::with_capacity(converted.len());
            let mut warnings = Vec::new();
            let mut converted = converted.into_iter();
            for piece in &segmentation.pieces {
                match piece {
                    Piece::Verbatim { start, end } => out.push_str(&text[*start..*end]),
                    Piece::Unit(region) => {
                        let unit = converted.next().ok_or_else(|| ConvertError::Assembly {
                            message: format!(
                                "no converted text for {} unit at {}..{}",
                                region.kind, region.start, region.end
                            ),
                        })?;
                        out.push_str(&unit.text);
                        units.push(unit.report);
                        warnings.extend(unit.warnings);
                    }
                }
            }

            Ok(TextConversion {
                text: out,
                units,
                warnings,
                whole_document: segmentation.whole_document,
            })
        }
        .boxed()
    }

    async fn convert_unit(
        &self,
        index: usize,
        region: &Region,
        source: Dialect,
        target: Dialect,
        pretty: bool,
        cancel: &CancellationToken,
    ) -> ConvertResult<UnitConversion> {
        if cancel.is_cancelled() {
            return Err(ConvertError::Cancelled);
        }
        let started = Instant::now();
        let complexity = self.analyzer.score(&region.text);
        let mut warnings = Vec::new();

        let dispatched = match region.kind {
            RegionKind::Plain => {
                let strategy = self.selector.select(source, target, complexity, false);
                let unit = Unit {
                    index,
                    text: &region.text,
                    source,
                    target,
                    complexity,
                    pretty,
                };
                let d = self.dispatch_sql(&unit, strategy, &mut warnings, cancel).await?;
                Dispatched {
                    text: harmonize_terminator(&d.text, &region.text),
                    ..d
                }
            }
            RegionKind::ProceduralBlock => {
                let strategy = self.selector.select(source, target, complexity, true);
                let unit = Unit {
                    index,
                    text: &region.text,
                    source,
                    target,
                    complexity,
                    pretty,
                };
                let d = self
                    .dispatch_procedural(&unit, strategy, &mut warnings, cancel)
                    .await?;
                Dispatched {
                    text: harmonize_terminator(&d.text, &region.text),
                    ..d
                }
            }
            RegionKind::DynamicCall => match self.matcher.parse_dynamic_call(&region.text) {
                Some(call) => {
                    let inner = self
                        .convert_text(&call.inner, source, target, pretty, cancel)
                        .await?;
                    warnings.extend(inner.warnings);
                    let converted = harmonize_terminator(&inner.text, &call.inner);
                    Dispatched::nested(
                        call.rebuild(&converted),
                        Strategy::RuleBased,
                        None,
                        &inner.units,
                    )
                }
                None => {
                    log::debug!("Unit {} looked like a dynamic call but did not parse", index);
                    Dispatched::rule_based(
                        region.text.clone(),
                        Strategy::RuleBased,
                        UnitOutcome::Passthrough,
                    )
                }
            },
            RegionKind::CommentBlock => {
                self.convert_comment(&region.text, source, target, pretty, &mut warnings, cancel)
                    .await?
            }
        };

        if dispatched.text.trim().is_empty() && !region.text.trim().is_empty() {
            return Err(ConvertError::Assembly {
                message: format!("{} unit {} converted to empty text", region.kind, index),
            });
        }

        let duration_ms = elapsed_ms(started);
        log::debug!(
            "Unit {} ({}, complexity {}) -> {} in {}ms",
            index,
            region.kind,
            complexity,
            dispatched.outcome,
            duration_ms
        );
        Ok(UnitConversion {
            report: UnitReport {
                index,
                kind: region.kind,
                span: region.span(),
                complexity,
                strategy: dispatched.strategy,
                outcome: dispatched.outcome,
                prompt: dispatched.prompt,
                cache_hit: dispatched.cache_hit,
                duration_ms,
            },
            text: dispatched.text,
            warnings,
        })
    }

    /// Plain SQL through the selected strategy
    async fn dispatch_sql(
        &self,
        unit: &Unit<'_>,
        strategy: Strategy,
        warnings: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> ConvertResult<Dispatched> {
        match strategy {
            Strategy::RuleBased => match self.transpile(unit) {
                Ok(text) => Ok(Dispatched::rule_based(
                    text,
                    Strategy::RuleBased,
                    UnitOutcome::RuleBased,
                )),
                Err(err) if err.is_parse_failure() => {
                    log::debug!(
                        "Unit {} rejected by {} ({}); retrying generatively",
                        unit.index,
                        self.engine.name(),
                        err
                    );
                    self.generate(
                        unit,
                        Strategy::Generative,
                        UnitOutcome::RuleBasedGenerativeRetry,
                        warnings,
                        cancel,
                    )
                    .await
                }
                Err(err) => Err(err.into()),
            },
            Strategy::Hybrid => {
                let failure = match self.transpile(unit) {
                    Ok(text) if !text.trim().is_empty() => {
                        return Ok(Dispatched::rule_based(
                            text,
                            Strategy::Hybrid,
                            UnitOutcome::HybridRuleBasedSuccess,
                        ));
                    }
                    Ok(_) => "no output".to_string(),
                    Err(err) => err.to_string(),
                };
                log::debug!("Unit {} rule-based attempt failed: {}", unit.index, failure);
                warnings.push(format!(
                    "unit {}: rule-based attempt failed ({}); used generative conversion",
                    unit.index, failure
                ));
                self.generate(
                    unit,
                    Strategy::Hybrid,
                    UnitOutcome::HybridGenerativeFallback,
                    warnings,
                    cancel,
                )
                .await
            }
            Strategy::Generative => {
                self.generate(unit, Strategy::Generative, UnitOutcome::Generative, warnings, cancel)
                    .await
            }
        }
    }

    /// Procedural blocks: structural rewrite where one exists, otherwise as SQL
    async fn dispatch_procedural(
        &self,
        unit: &Unit<'_>,
        strategy: Strategy,
        warnings: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> ConvertResult<Dispatched> {
        if strategy == Strategy::Generative
            || !supports_structural_rewrite(unit.source, unit.target)
        {
            return self.dispatch_sql(unit, strategy, warnings, cancel).await;
        }

        match self.structural_rewrite(unit, strategy, warnings, cancel).await {
            Err(ConvertError::ParseFailure(err)) => {
                log::debug!("Unit {} has no structural rewrite: {}", unit.index, err);
                let (kept, outcome) = match strategy {
                    Strategy::Hybrid => {
                        warnings.push(format!(
                            "unit {}: structural rewrite failed ({}); used generative conversion",
                            unit.index, err
                        ));
                        (Strategy::Hybrid, UnitOutcome::HybridGenerativeFallback)
                    }
                    _ => (Strategy::Generative, UnitOutcome::RuleBasedGenerativeRetry),
                };
                self.generate(unit, kept, outcome, warnings, cancel).await
            }
            other => other,
        }
    }

    /// Re-emit a procedure in the target's procedural language, converting
    /// its body through the full pipeline
    async fn structural_rewrite(
        &self,
        unit: &Unit<'_>,
        strategy: Strategy,
        warnings: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> ConvertResult<Dispatched> {
        let procedure = OracleProcedure::parse(unit.text)?;
        let body = self
            .convert_text(&procedure.body, unit.source, unit.target, unit.pretty, cancel)
            .await?;
        warnings.extend(body.warnings);
        Ok(Dispatched::nested(
            procedure.render_plpgsql(&body.text),
            strategy,
            Some(UnitOutcome::StructuralRewrite),
            &body.units,
        ))
    }

    /// Convert dynamic calls quoted inside a comment, leaving the rest as is
    async fn convert_comment(
        &self,
        text: &str,
        source: Dialect,
        target: Dialect,
        pretty: bool,
        warnings: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> ConvertResult<Dispatched> {
        let mut out = String::with_capacity(text.len());
        let mut units = Vec::new();
        let mut cursor = 0;

        for range in self.matcher.dynamic_calls_in(text) {
            out.push_str(&text[cursor..range.start]);
            let call_text = &text[range.clone()];
            cursor = range.end;

            let Some(call) = self.matcher.parse_dynamic_call(call_text) else {
                out.push_str(call_text);
                continue;
            };
            match self
                .convert_text(&call.inner, source, target, pretty, cancel)
                .await
            {
                Ok(inner) => {
                    let converted = harmonize_terminator(&inner.text, &call.inner);
                    out.push_str(&call.rebuild(&converted));
                    units.extend(inner.units);
                    warnings.extend(inner.warnings);
                }
                Err(err) if err.is_recoverable() => {
                    warnings.push(format!("left commented dynamic call unconverted: {}", err));
                    out.push_str(call_text);
                }
                Err(err) => return Err(err),
            }
        }
        out.push_str(&text[cursor..]);

        Ok(Dispatched::nested(out, Strategy::RuleBased, None, &units))
    }

    fn transpile(&self, unit: &Unit<'_>) -> dx_sql::SqlResult<String> {
        self.engine
            .transpile(unit.text, unit.source, unit.target, unit.pretty)
    }

    async fn generate(
        &self,
        unit: &Unit<'_>,
        strategy: Strategy,
        outcome: UnitOutcome,
        warnings: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> ConvertResult<Dispatched> {
        let request = GenerativeRequest {
            sql: unit.text,
            source: unit.source,
            target: unit.target,
            complexity: unit.complexity,
        };
        let output = self.generative.convert(&request, cancel).await?;
        if output.cache_hit {
            log::debug!("Unit {} served from cache", unit.index);
        }
        if output.used_fallback_prompt {
            warnings.push(format!(
                "unit {}: first generative response was rejected; used the basic prompt",
                unit.index
            ));
        }
        Ok(Dispatched::generative(output, strategy, outcome))
    }
}

/// A unit's text with everything the converters need to know about it
struct Unit<'a> {
    index: usize,
    text: &'a str,
    source: Dialect,
    target: Dialect,
    complexity: u8,
    pretty: bool,
}

fn validate_request(
    document: &str,
    source: &str,
    target: &str,
) -> ConvertResult<(Dialect, Dialect)> {
    if document.trim().is_empty() {
        return Err(ConvertError::validation("input SQL is empty"));
    }
    let source = Dialect::parse_name(source)?;
    let target = Dialect::parse_name(target)?;
    Ok((source, target))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;

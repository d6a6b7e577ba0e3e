//! Analysis engine
//!
//! The public entry points. Per snippet: hazards first (terminal on a
//! match), otherwise features, the time and space rule engines and the
//! safety clamps. Ground truth is looked up alongside and, when it matches,
//! outranks everything else. The engine holds only immutable state, so one
//! instance can be shared across threads.

use crate::amortized::{self, AmortizedVerdict};
use crate::complexity::ComplexityClass;
use crate::config::{ResolvedConfig, DEFAULT_CLAIM_CONFIDENCE};
use crate::consensus::{
    self, rank_layers, ClaimedComplexity, ConsensusResult, LayerKind, SlotEvidence, ValidationLayer,
    PATTERN_DETECTOR_CONFIDENCE,
};
use crate::features::{self, loops};
use crate::ground_truth::{GroundTruthDb, GroundTruthMatch, MatchKind, DEFAULT_FINGERPRINT_THRESHOLD};
use crate::hazards;
use crate::language::Language;
use crate::result::{Approach, ApproachTriple, ComplexityResult, Correction};
use crate::safety;
use crate::source::{isolate, Source};
use crate::space::derive_space;
use crate::time::derive_time;
use anyhow::{Context, Result};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub fingerprint_threshold: f64,
    pub claim_confidence: f64,
    pub disabled_hazards: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            fingerprint_threshold: DEFAULT_FINGERPRINT_THRESHOLD,
            claim_confidence: DEFAULT_CLAIM_CONFIDENCE,
            disabled_hazards: Vec::new(),
        }
    }
}

/// Outcome of checking one claimed complexity against the analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimCheck {
    /// Both claimed values parsed and agree with the verdict
    pub valid: bool,
    pub corrected_result: ComplexityResult,
}

#[derive(Debug, Clone)]
pub struct Engine {
    ground_truth: Arc<GroundTruthDb>,
    settings: EngineSettings,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    /// Built-in ground truth and default settings
    pub fn new() -> Self {
        Engine::with_ground_truth(GroundTruthDb::builtin())
    }

    pub fn with_ground_truth(ground_truth: Arc<GroundTruthDb>) -> Self {
        Engine { ground_truth, settings: EngineSettings::default() }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Engine configured from a resolved config, loading any extra dataset.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let builtin = GroundTruthDb::builtin();
        let ground_truth = match &config.ground_truth {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read ground truth dataset: {}", path.display()))?;
                let extra = GroundTruthDb::from_json(&json)
                    .with_context(|| format!("invalid ground truth dataset: {}", path.display()))?;
                let merged = builtin
                    .merged(extra)
                    .with_context(|| format!("cannot merge ground truth dataset: {}", path.display()))?;
                tracing::debug!(entries = merged.len(), path = %path.display(), "merged ground truth dataset");
                Arc::new(merged)
            }
            None => builtin,
        };
        Ok(Engine::with_ground_truth(ground_truth).with_settings(EngineSettings {
            fingerprint_threshold: config.fingerprint_threshold,
            claim_confidence: config.claim_confidence,
            disabled_hazards: config.disabled_hazards.clone(),
        }))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn ground_truth(&self) -> &GroundTruthDb {
        &self.ground_truth
    }

    /// One time and space verdict for `code`.
    ///
    /// Never fails: empty or unrecognizable input yields the no-feature
    /// verdict, and a failing pipeline yields the conservative fallback.
    pub fn analyze(&self, code: &str, language: Language, title: Option<&str>) -> ComplexityResult {
        let src = Source::new(code, language);
        let (heuristic, amortized) = self.heuristic(&src);
        let truth = self.lookup(&src, title).filter(|m| agrees_with(m, &heuristic));

        let mut layers = vec![ValidationLayer {
            kind: LayerKind::RuleEngine,
            confidence: heuristic.confidence,
            candidate: heuristic.clone(),
        }];
        if let Some(verdict) = &amortized {
            if verdict.time != heuristic.time_complexity {
                tracing::debug!(pattern = verdict.pattern, amortized = %verdict.time, rules = %heuristic.time_complexity, "amortized cross-check disagrees");
            }
            layers.push(ValidationLayer {
                kind: LayerKind::PatternDetector,
                confidence: PATTERN_DETECTOR_CONFIDENCE,
                candidate: amortized_result(verdict),
            });
        }
        if let Some(m) = truth {
            layers.push(ValidationLayer {
                kind: LayerKind::GroundTruth,
                confidence: m.confidence,
                candidate: ground_truth_result(m, &heuristic),
            });
        }

        rank_layers(layers).map_or(heuristic, |winner| winner.candidate)
    }

    /// Compare a claimed `(time, space)` with the analysis of `code`.
    pub fn validate_against_claim(
        &self,
        code: &str,
        language: Language,
        claimed_time: &str,
        claimed_space: &str,
    ) -> ClaimCheck {
        let mut result = self.analyze(code, language, None);
        let before = result.corrections_applied.len();

        match claimed_time.parse::<ComplexityClass>() {
            Ok(time) if time == result.time_complexity => {}
            Ok(time) => result.corrections_applied.push(Correction::time(
                Approach::Single,
                time,
                result.time_complexity,
                format!("{} overrides the claim: {}", result.source, result.time_complexity_reason),
            )),
            Err(e) => result.corrections_applied.push(Correction::time(
                Approach::Single,
                claimed_time,
                result.time_complexity,
                e.to_string(),
            )),
        }
        match claimed_space.parse::<ComplexityClass>() {
            Ok(space) if space == result.space_complexity => {}
            Ok(space) => result.corrections_applied.push(Correction::space(
                Approach::Single,
                space,
                result.space_complexity,
                format!("{} overrides the claim: {}", result.source, result.space_complexity_reason),
            )),
            Err(e) => result.corrections_applied.push(Correction::space(
                Approach::Single,
                claimed_space,
                result.space_complexity,
                e.to_string(),
            )),
        }

        let valid = result.corrections_applied.len() == before;
        tracing::debug!(valid, time = %result.time_complexity, space = %result.space_complexity, "claim checked");
        ClaimCheck { valid, corrected_result: result }
    }

    /// Reconcile a brute/better/optimal triple of code and claims.
    pub fn validate_triple(
        &self,
        title: Option<&str>,
        language: Language,
        code: &ApproachTriple<String>,
        claims: &ApproachTriple<ClaimedComplexity>,
    ) -> ConsensusResult {
        let by_title = title.and_then(|t| self.ground_truth.by_title(t));
        let truth = by_title
            .map(|entry| GroundTruthMatch { entry, kind: MatchKind::Title, confidence: 1.0 })
            .or_else(|| {
                code.optimal
                    .as_deref()
                    .or(code.brute_force.as_deref())
                    .and_then(|c| self.lookup(&Source::new(c, language), None))
            });

        let slot = |approach: Approach| -> Option<SlotEvidence> {
            let snippet = code.get(approach);
            let claim = claims.get(approach).cloned();
            if snippet.is_none() && claim.is_none() {
                return None;
            }
            let (analysis, amortized) = match snippet {
                Some(text) => {
                    let src = Source::new(text, language);
                    let (result, amortized) = self.heuristic(&src);
                    (Some(result), amortized)
                }
                None => (None, None),
            };
            Some(SlotEvidence { analysis, amortized, claim })
        };
        let evidence = ApproachTriple {
            brute_force: slot(Approach::BruteForce),
            better: slot(Approach::Better),
            optimal: slot(Approach::Optimal),
        };

        consensus::build(truth, evidence, self.settings.claim_confidence)
    }

    fn lookup(&self, src: &Source, title: Option<&str>) -> Option<GroundTruthMatch<'_>> {
        isolate("ground_truth", || None, || {
            self.ground_truth.lookup(src, title, self.settings.fingerprint_threshold)
        })
    }

    /// Hazard or rule-engine verdict plus the amortized cross-check, with
    /// the conservative fallback if anything escapes isolation.
    fn heuristic(&self, src: &Source) -> (ComplexityResult, Option<AmortizedVerdict>) {
        match catch_unwind(AssertUnwindSafe(|| self.pipeline(src))) {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!("analysis pipeline panicked; using fallback verdict");
                (ComplexityResult::fallback(), None)
            }
        }
    }

    fn pipeline(&self, src: &Source) -> (ComplexityResult, Option<AmortizedVerdict>) {
        if let Some(hit) = hazards::match_hazard(src, &self.settings.disabled_hazards) {
            return (hit, None);
        }

        let features = features::extract_from(src);
        let time = derive_time(&features);
        let space = derive_space(&features);

        let confidence = match time.source {
            Some(s) if s.is_priority() => 0.85,
            Some(_) => 0.75,
            None => 0.6,
        };
        let mut result = ComplexityResult::new(
            time.complexity,
            time.explanation,
            space.complexity,
            space.explanation,
            "rule_engine",
            confidence,
        );
        result.space_metrics = space.metrics;
        result.pattern = features.metrics.dominant_pattern.clone();
        let result = safety::verify(result, &features);

        let amortized = isolate("amortized", || None, || {
            let scan = loops::scan(src);
            amortized::detect_in(src, &scan)
        });
        (result, amortized)
    }
}

/// A title match always stands; a fingerprint match only when one of the
/// entry's approaches has the time the heuristic found.
fn agrees_with(m: &GroundTruthMatch<'_>, heuristic: &ComplexityResult) -> bool {
    if m.kind == MatchKind::Title {
        return true;
    }
    let (_, known) = m.entry.closest(heuristic.time_complexity);
    let agrees = known.time == heuristic.time_complexity;
    if !agrees {
        tracing::debug!(id = %m.entry.id, known = %known.time, rules = %heuristic.time_complexity, "fingerprint match disagrees with analysis; ignored");
    }
    agrees
}

fn amortized_result(verdict: &AmortizedVerdict) -> ComplexityResult {
    ComplexityResult::new(
        verdict.time,
        verdict.reason.clone(),
        verdict.space,
        verdict.reason.clone(),
        format!("amortized:{}", verdict.pattern),
        PATTERN_DETECTOR_CONFIDENCE,
    )
    .with_pattern(verdict.pattern)
}

/// Ground truth verdict for the approach nearest the heuristic one, with the
/// heuristic values it replaces recorded as corrections.
fn ground_truth_result(m: GroundTruthMatch<'_>, heuristic: &ComplexityResult) -> ComplexityResult {
    let (slot, known) = m.entry.closest(heuristic.time_complexity);
    let why = known.reason.as_deref().unwrap_or(&known.algorithm);
    let reason = format!("{} ({}): {}", m.entry.id, slot, why);

    let mut result = ComplexityResult::new(known.time, &reason, known.space, &reason, "ground_truth", m.confidence)
        .with_pattern(m.entry.id.clone());
    if heuristic.time_complexity != known.time {
        result.corrections_applied.push(Correction::time(
            Approach::Single,
            heuristic.time_complexity,
            known.time,
            format!("ground truth for {}", m.entry.id),
        ));
    }
    if heuristic.space_complexity != known.space {
        result.corrections_applied.push(Correction::space(
            Approach::Single,
            heuristic.space_complexity,
            known.space,
            format!("ground truth for {}", m.entry.id),
        ));
    }
    tracing::debug!(id = %m.entry.id, approach = %slot, time = %known.time, space = %known.space, "ground truth verdict");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new()
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_single_loop_is_linear_constant() {
        let r = engine().analyze("def f(nums):\n    total = 0\n    for x in nums:\n        total += x\n    return total\n", Language::Python, None);
        assert_eq!(r.time_complexity, ComplexityClass::Linear);
        assert_eq!(r.space_complexity, ComplexityClass::Constant);
        assert_eq!(r.source, "rule_engine");
    }

    #[test]
    fn test_empty_input_is_constant() {
        let r = engine().analyze("", Language::Unknown, None);
        assert_eq!(r.time_complexity, ComplexityClass::Constant);
        assert_eq!(r.space_complexity, ComplexityClass::Constant);
    }

    #[test]
    fn test_hazard_short_circuits() {
        let code = "\
def merge_sort(arr):
    if len(arr) <= 1:
        return arr
    mid = len(arr) // 2
    return merge(merge_sort(arr[:mid]), merge_sort(arr[mid:]))
";
        let r = engine().analyze(code, Language::Python, None);
        assert_eq!(r.source, "hazard:merge_sort");
        assert_eq!(r.time_complexity, ComplexityClass::NLogN);
        assert_eq!(r.space_complexity, ComplexityClass::Linear);
    }

    #[test]
    fn test_disabled_hazard_falls_through_to_rules() {
        let code = "def gcd(a, b):\n    return a if b == 0 else gcd(b, a % b)\n";
        let settings = EngineSettings {
            disabled_hazards: vec!["gcd_recursive".to_string()],
            ..EngineSettings::default()
        };
        let r = Engine::new().with_settings(settings).analyze(code, Language::Python, None);
        assert_eq!(r.source, "rule_engine");
    }

    #[test]
    fn test_title_ground_truth_wins() {
        let code = "\
def two_sum(nums, target):
    seen = {}
    for i, x in enumerate(nums):
        if target - x in seen:
            return [seen[target - x], i]
        seen[x] = i
";
        let r = engine().analyze(code, Language::Python, Some("1. Two Sum"));
        assert_eq!(r.source, "ground_truth");
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.time_complexity, ComplexityClass::Linear);
        assert_eq!(r.space_complexity, ComplexityClass::Linear);
    }

    #[test]
    fn test_ground_truth_picks_nearest_approach() {
        let code = "\
def two_sum(nums, target):
    for i in range(len(nums)):
        for j in range(i + 1, len(nums)):
            if nums[i] + nums[j] == target:
                return [i, j]
";
        let r = engine().analyze(code, Language::Python, Some("Two Sum"));
        assert_eq!(r.time_complexity, ComplexityClass::Quadratic);
        assert_eq!(r.space_complexity, ComplexityClass::Constant);
        assert!(r.time_complexity_reason.contains("brute_force"));
    }

    #[test]
    fn test_fingerprint_match_must_agree_with_analysis() {
        let code = "\
def binary_search(nums, target):
    for i in range(len(nums)):
        for j in range(len(nums)):
            mid = nums[i] + nums[j]
            if mid == target:
                return True
    return False
";
        let src = Source::new(code, Language::Python);
        let eng = engine();
        let m = eng.lookup(&src, None).unwrap();
        assert_eq!(m.entry.id, "binary-search");
        assert_eq!(m.kind, MatchKind::Fingerprint);

        let r = engine().analyze(code, Language::Python, None);
        assert_ne!(r.source, "ground_truth");
        assert_eq!(r.time_complexity, ComplexityClass::Quadratic);
    }

    #[test]
    fn test_claim_check() {
        let code = "for i in range(n):\n    for j in range(n):\n        c += 1\n";
        let ok = engine().validate_against_claim(code, Language::Python, "O(n^2)", "O(1)");
        assert!(ok.valid);
        assert!(ok.corrected_result.corrections_applied.is_empty());

        let wrong = engine().validate_against_claim(code, Language::Python, "O(n)", "O(1)");
        assert!(!wrong.valid);
        assert_eq!(wrong.corrected_result.time_complexity, ComplexityClass::Quadratic);
        assert_eq!(wrong.corrected_result.corrections_applied[0].old_value, "O(n)");

        let garbage = engine().validate_against_claim(code, Language::Python, "quick", "O(1)");
        assert!(!garbage.valid);
        assert_eq!(garbage.corrected_result.corrections_applied[0].old_value, "quick");
    }

    #[test]
    fn test_triple_with_title() {
        let code = ApproachTriple {
            brute_force: Some("for i in range(n):\n    for j in range(n):\n        pass\n".to_string()),
            better: None,
            optimal: Some("seen = {}\nfor x in nums:\n    seen[x] = 1\n".to_string()),
        };
        let claims = ApproachTriple {
            brute_force: Some(ClaimedComplexity::new("O(n^2)", "O(1)")),
            better: Some(ClaimedComplexity::new("O(n)", "O(1)")),
            optimal: Some(ClaimedComplexity::new("O(n)", "O(1)")),
        };
        let r = engine().validate_triple(Some("Two Sum"), Language::Python, &code, &claims);
        assert_eq!(r.source, "ground_truth");
        assert!(r.solution.better.is_none());
        let optimal = r.solution.optimal.as_ref().unwrap();
        assert_eq!(optimal.space_complexity, ComplexityClass::Linear);
        assert!(r.corrections.iter().any(|c| c.approach == Approach::Optimal));
    }

    #[test]
    fn test_triple_without_ground_truth() {
        let code = ApproachTriple {
            brute_force: Some("for i in range(n):\n    for j in range(n):\n        c += 1\n".to_string()),
            better: Some("for x in nums:\n    c += x\n".to_string()),
            optimal: Some("for x in nums:\n    c -= x\n".to_string()),
        };
        let r = engine().validate_triple(None, Language::Python, &code, &ApproachTriple::default());
        assert_eq!(r.source, "rule_engine");
        assert!(r.solution.better.is_none());
        assert!(r.corrections[0].reason.contains("same time and space"));
    }
}

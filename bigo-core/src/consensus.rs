//! Consensus builder
//!
//! Merges every available opinion about a solution into one corrected,
//! audited answer. Opinions come from fixed-priority layers: ground truth,
//! then hazard/rule-engine analysis, then the amortized cross-check, then
//! an externally supplied claim. For each approach slot the highest-priority
//! layer wins (confidence breaks ties) and every claimed value it overwrites
//! is recorded as a `Correction`.
//!
//! After layer selection the brute/better/optimal progression is repaired:
//! - an entry without an optimization ladder has no `better`
//! - `optimal` never costs more than `brute_force` (swapped otherwise)
//! - `better` identical to `optimal` is dropped
//! - `better` must sit strictly between its neighbours
//! - a lone `brute_force` is also the `optimal` answer

use crate::amortized::AmortizedVerdict;
use crate::complexity::ComplexityClass;
use crate::ground_truth::{GroundTruthMatch, KnownApproach};
use crate::result::{Approach, ApproachTriple, ComplexityResult, Correction};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence assigned to an amortized cross-check verdict
pub const PATTERN_DETECTOR_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    GroundTruth,
    RuleEngine,
    PatternDetector,
    ExternalClaim,
}

impl LayerKind {
    /// Lower wins
    pub fn priority(&self) -> u8 {
        match self {
            LayerKind::GroundTruth => 1,
            LayerKind::RuleEngine => 2,
            LayerKind::PatternDetector => 3,
            LayerKind::ExternalClaim => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::GroundTruth => "ground_truth",
            LayerKind::RuleEngine => "rule_engine",
            LayerKind::PatternDetector => "pattern_detector",
            LayerKind::ExternalClaim => "external_claim",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One layer's opinion
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationLayer<T> {
    pub kind: LayerKind,
    pub confidence: f64,
    pub candidate: T,
}

/// Highest-priority layer, highest confidence among equals; first wins exact ties.
pub fn rank_layers<T>(layers: Vec<ValidationLayer<T>>) -> Option<ValidationLayer<T>> {
    let mut best: Option<ValidationLayer<T>> = None;
    for layer in layers {
        let better = match &best {
            None => true,
            Some(b) => {
                layer.kind.priority() < b.kind.priority()
                    || (layer.kind.priority() == b.kind.priority() && layer.confidence > b.confidence)
            }
        };
        if better {
            best = Some(layer);
        }
    }
    best
}

/// Complexity claimed by an outside source, as free-form notation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimedComplexity {
    pub time: String,
    pub space: String,
}

impl ClaimedComplexity {
    pub fn new(time: impl Into<String>, space: impl Into<String>) -> Self {
        ClaimedComplexity { time: time.into(), space: space.into() }
    }
}

/// Final verdict for one approach slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedApproach {
    pub time_complexity: ComplexityClass,
    pub space_complexity: ComplexityClass,
    pub reason: String,
    pub algorithm: Option<String>,
    /// Layer that supplied the values
    pub source: String,
    pub confidence: f64,
}

impl ValidatedApproach {
    fn cost(&self) -> (ComplexityClass, ComplexityClass) {
        (self.time_complexity, self.space_complexity)
    }

    fn from_known(known: &KnownApproach, confidence: f64) -> Self {
        ValidatedApproach {
            time_complexity: known.time,
            space_complexity: known.space,
            reason: known.reason.clone().unwrap_or_else(|| known.algorithm.clone()),
            algorithm: Some(known.algorithm.clone()),
            source: LayerKind::GroundTruth.as_str().to_string(),
            confidence,
        }
    }

    fn from_result(result: &ComplexityResult) -> Self {
        ValidatedApproach {
            time_complexity: result.time_complexity,
            space_complexity: result.space_complexity,
            reason: result.time_complexity_reason.clone(),
            algorithm: result.pattern.clone(),
            source: result.source.clone(),
            confidence: result.confidence,
        }
    }

    fn from_amortized(verdict: &AmortizedVerdict) -> Self {
        ValidatedApproach {
            time_complexity: verdict.time,
            space_complexity: verdict.space,
            reason: verdict.reason.clone(),
            algorithm: Some(verdict.pattern.to_string()),
            source: format!("amortized:{}", verdict.pattern),
            confidence: PATTERN_DETECTOR_CONFIDENCE,
        }
    }
}

impl fmt::Display for ValidatedApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} time, {} space", self.time_complexity, self.space_complexity)
    }
}

/// Everything known about one approach slot before consensus
#[derive(Debug, Clone, Default)]
pub struct SlotEvidence {
    pub analysis: Option<ComplexityResult>,
    pub amortized: Option<AmortizedVerdict>,
    pub claim: Option<ClaimedComplexity>,
}

impl SlotEvidence {
    fn is_empty(&self) -> bool {
        self.analysis.is_none() && self.amortized.is_none() && self.claim.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    /// Every claim survived unchanged
    pub valid: bool,
    /// Highest-priority layer that decided any slot
    pub source: String,
    /// Lowest confidence among the deciding layers
    pub confidence: f64,
    pub solution: ApproachTriple<ValidatedApproach>,
    pub corrections: Vec<Correction>,
    pub notes: Vec<String>,
}

/// Merge ground truth, per-slot evidence and claims into one solution.
pub fn build(
    ground_truth: Option<GroundTruthMatch<'_>>,
    evidence: ApproachTriple<SlotEvidence>,
    claim_confidence: f64,
) -> ConsensusResult {
    let mut corrections = Vec::new();
    let mut deciders: Vec<(LayerKind, f64)> = Vec::new();

    let solution = evidence.map(|slot, ev| {
        if ev.is_empty() {
            return None;
        }
        let decided = decide_slot(slot, &ev, ground_truth, claim_confidence, &mut corrections);
        if let Some((kind, approach)) = &decided {
            deciders.push((*kind, approach.confidence));
        }
        decided.map(|(_, approach)| approach)
    });
    let mut solution = ApproachTriple {
        brute_force: solution.brute_force.flatten(),
        better: solution.better.flatten(),
        optimal: solution.optimal.flatten(),
    };

    let mut notes = Vec::new();
    repair_progression(&mut solution, ground_truth, &mut corrections, &mut notes);

    let source = deciders
        .iter()
        .min_by_key(|(kind, _)| kind.priority())
        .map_or("none", |(kind, _)| kind.as_str())
        .to_string();
    let confidence = deciders
        .iter()
        .map(|(_, c)| *c)
        .fold(None, |acc: Option<f64>, c| Some(acc.map_or(c, |a| a.min(c))))
        .unwrap_or(0.0);

    for c in &corrections {
        tracing::debug!(approach = %c.approach, field = ?c.field, old = %c.old_value, new = %c.new_value, "consensus correction");
    }

    ConsensusResult {
        valid: corrections.is_empty(),
        source,
        confidence,
        solution,
        corrections,
        notes,
    }
}

/// Parse a claim, recording every unparseable field.
fn parse_claim(
    slot: Approach,
    claim: &ClaimedComplexity,
    corrections: &mut Vec<Correction>,
) -> Option<(ComplexityClass, ComplexityClass)> {
    let time = claim.time.parse::<ComplexityClass>();
    let space = claim.space.parse::<ComplexityClass>();
    if let Err(e) = &time {
        corrections.push(Correction::time(slot, &claim.time, "unparseable", e.to_string()));
    }
    if let Err(e) = &space {
        corrections.push(Correction::space(slot, &claim.space, "unparseable", e.to_string()));
    }
    Some((time.ok()?, space.ok()?))
}

fn decide_slot(
    slot: Approach,
    ev: &SlotEvidence,
    ground_truth: Option<GroundTruthMatch<'_>>,
    claim_confidence: f64,
    corrections: &mut Vec<Correction>,
) -> Option<(LayerKind, ValidatedApproach)> {
    let mut layers = Vec::new();
    if let Some(gt) = ground_truth {
        if let Some(known) = gt.entry.approaches().get(slot) {
            layers.push(ValidationLayer {
                kind: LayerKind::GroundTruth,
                confidence: gt.confidence,
                candidate: ValidatedApproach::from_known(known, gt.confidence),
            });
        }
    }
    if let Some(result) = &ev.analysis {
        layers.push(ValidationLayer {
            kind: LayerKind::RuleEngine,
            confidence: result.confidence,
            candidate: ValidatedApproach::from_result(result),
        });
    }
    if let Some(verdict) = &ev.amortized {
        layers.push(ValidationLayer {
            kind: LayerKind::PatternDetector,
            confidence: PATTERN_DETECTOR_CONFIDENCE,
            candidate: ValidatedApproach::from_amortized(verdict),
        });
    }
    let claimed = ev.claim.as_ref().and_then(|c| parse_claim(slot, c, corrections));
    if let Some((time, space)) = claimed {
        layers.push(ValidationLayer {
            kind: LayerKind::ExternalClaim,
            confidence: claim_confidence,
            candidate: ValidatedApproach {
                time_complexity: time,
                space_complexity: space,
                reason: "claimed".to_string(),
                algorithm: None,
                source: LayerKind::ExternalClaim.as_str().to_string(),
                confidence: claim_confidence,
            },
        });
    }

    let winner = rank_layers(layers)?;
    if let Some((time, space)) = claimed {
        let why = format!("{} overrides the claim", winner.kind);
        if time != winner.candidate.time_complexity {
            corrections.push(Correction::time(slot, time, winner.candidate.time_complexity, &why));
        }
        if space != winner.candidate.space_complexity {
            corrections.push(Correction::space(slot, space, winner.candidate.space_complexity, why));
        }
    }
    Some((winner.kind, winner.candidate))
}

fn describe(a: Option<&ValidatedApproach>) -> String {
    a.map_or_else(|| "absent".to_string(), |a| a.to_string())
}

fn repair_progression(
    solution: &mut ApproachTriple<ValidatedApproach>,
    ground_truth: Option<GroundTruthMatch<'_>>,
    corrections: &mut Vec<Correction>,
    notes: &mut Vec<String>,
) {
    if let Some(gt) = ground_truth {
        if !gt.entry.has_optimization_ladder {
            if let Some(better) = solution.better.take() {
                corrections.push(Correction::presence(
                    Approach::Better,
                    better,
                    "absent",
                    format!("{} has no intermediate approach between brute force and optimal", gt.entry.id),
                ));
            }
        }
    }

    if let (Some(brute), Some(optimal)) = (&solution.brute_force, &solution.optimal) {
        if optimal.cost() > brute.cost() {
            corrections.push(Correction::presence(
                Approach::Optimal,
                optimal,
                brute,
                "optimal ranked worse than brute force; swapped",
            ));
            corrections.push(Correction::presence(
                Approach::BruteForce,
                brute,
                optimal,
                "brute force ranked better than optimal; swapped",
            ));
            std::mem::swap(&mut solution.brute_force, &mut solution.optimal);
        }
    }

    if let (Some(better), Some(optimal)) = (&solution.better, &solution.optimal) {
        if better.cost() == optimal.cost() {
            corrections.push(Correction::presence(
                Approach::Better,
                describe(solution.better.as_ref()),
                "absent",
                "better has the same time and space as optimal",
            ));
            solution.better = None;
        }
    }

    if let Some(better) = &solution.better {
        let above_optimal = solution.optimal.as_ref().map_or(true, |o| better.cost() > o.cost());
        let below_brute = solution.brute_force.as_ref().map_or(true, |b| better.cost() < b.cost());
        if !(above_optimal && below_brute) {
            corrections.push(Correction::presence(
                Approach::Better,
                describe(Some(better)),
                "absent",
                "better does not sit strictly between brute force and optimal",
            ));
            solution.better = None;
        }
    }

    if solution.optimal.is_none() && solution.better.is_none() {
        if let Some(brute) = &solution.brute_force {
            solution.optimal = Some(brute.clone());
            notes.push("brute force is already optimal".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground_truth::{GroundTruthDb, MatchKind};

    fn analysis(time: ComplexityClass, space: ComplexityClass) -> SlotEvidence {
        SlotEvidence {
            analysis: Some(ComplexityResult::new(time, "rule", space, "rule", "rule_engine", 0.8)),
            ..Default::default()
        }
    }

    fn claimed(time: &str, space: &str) -> SlotEvidence {
        SlotEvidence { claim: Some(ClaimedComplexity::new(time, space)), ..Default::default() }
    }

    fn layer(kind: LayerKind, confidence: f64, tag: &'static str) -> ValidationLayer<&'static str> {
        ValidationLayer { kind, confidence, candidate: tag }
    }

    #[test]
    fn test_rank_layers() {
        let winner = rank_layers(vec![
            layer(LayerKind::ExternalClaim, 0.99, "claim"),
            layer(LayerKind::RuleEngine, 0.7, "rules"),
            layer(LayerKind::RuleEngine, 0.9, "hazard"),
            layer(LayerKind::PatternDetector, 0.95, "amortized"),
        ])
        .unwrap();
        assert_eq!(winner.candidate, "hazard");
        assert!(rank_layers::<()>(Vec::new()).is_none());

        let winner = rank_layers(vec![
            layer(LayerKind::RuleEngine, 1.0, "rules"),
            layer(LayerKind::GroundTruth, 0.95, "truth"),
        ])
        .unwrap();
        assert_eq!(winner.kind, LayerKind::GroundTruth);
    }

    #[test]
    fn test_better_identical_to_optimal_is_dropped() {
        use ComplexityClass::*;
        let evidence = ApproachTriple {
            brute_force: Some(analysis(Quadratic, Constant)),
            better: Some(analysis(Linear, Constant)),
            optimal: Some(analysis(Linear, Constant)),
        };
        let r = build(None, evidence, 0.5);
        assert!(r.solution.better.is_none());
        assert!(!r.valid);
        assert_eq!(r.corrections.len(), 1);
        assert_eq!(r.corrections[0].approach, Approach::Better);
        assert!(r.corrections[0].reason.contains("same time and space"));
    }

    #[test]
    fn test_swapped_approaches() {
        use ComplexityClass::*;
        let evidence = ApproachTriple {
            brute_force: Some(analysis(Linear, Constant)),
            better: None,
            optimal: Some(analysis(Quadratic, Constant)),
        };
        let r = build(None, evidence, 0.5);
        assert_eq!(r.solution.brute_force.unwrap().time_complexity, Quadratic);
        assert_eq!(r.solution.optimal.unwrap().time_complexity, Linear);
        assert_eq!(r.corrections.len(), 2);
    }

    #[test]
    fn test_better_outside_range_is_dropped() {
        use ComplexityClass::*;
        let evidence = ApproachTriple {
            brute_force: Some(analysis(NLogN, Constant)),
            better: Some(analysis(Cubic, Constant)),
            optimal: Some(analysis(Linear, Constant)),
        };
        let r = build(None, evidence, 0.5);
        assert!(r.solution.better.is_none());
        assert!(r.corrections[0].reason.contains("strictly between"));
    }

    #[test]
    fn test_lone_brute_force_becomes_optimal() {
        use ComplexityClass::*;
        let evidence = ApproachTriple {
            brute_force: Some(analysis(Linear, Constant)),
            ..Default::default()
        };
        let r = build(None, evidence, 0.5);
        assert!(r.valid);
        assert_eq!(r.solution.optimal.as_ref().unwrap().time_complexity, Linear);
        assert_eq!(r.notes, vec!["brute force is already optimal".to_string()]);
    }

    #[test]
    fn test_claims_are_corrected_by_analysis() {
        let evidence = ApproachTriple {
            optimal: Some(SlotEvidence {
                claim: Some(ClaimedComplexity::new("O(n^2)", "O(1)")),
                ..analysis(ComplexityClass::Linear, ComplexityClass::Constant)
            }),
            ..Default::default()
        };
        let r = build(None, evidence, 0.5);
        assert!(!r.valid);
        assert_eq!(r.source, "rule_engine");
        assert_eq!(r.corrections.len(), 1);
        assert_eq!(r.corrections[0].old_value, "O(n²)");
        assert_eq!(r.corrections[0].new_value, "O(n)");
    }

    #[test]
    fn test_claim_alone_is_accepted() {
        let evidence = ApproachTriple { optimal: Some(claimed("O(N log N)", "O(n)")), ..Default::default() };
        let r = build(None, evidence, 0.5);
        assert!(r.valid);
        assert_eq!(r.source, "external_claim");
        assert_eq!(r.confidence, 0.5);
        assert_eq!(r.solution.optimal.unwrap().time_complexity, ComplexityClass::NLogN);
    }

    #[test]
    fn test_unparseable_claim_is_recorded() {
        let evidence = ApproachTriple {
            optimal: Some(SlotEvidence {
                claim: Some(ClaimedComplexity::new("fast", "O(1)")),
                ..analysis(ComplexityClass::Linear, ComplexityClass::Constant)
            }),
            ..Default::default()
        };
        let r = build(None, evidence, 0.5);
        assert!(!r.valid);
        assert_eq!(r.corrections[0].old_value, "fast");
        assert_eq!(r.solution.optimal.unwrap().time_complexity, ComplexityClass::Linear);
    }

    #[test]
    fn test_ground_truth_without_ladder() {
        let db = GroundTruthDb::builtin();
        let entry = db.get("two-sum").unwrap();
        let gt = GroundTruthMatch { entry, kind: MatchKind::Title, confidence: 1.0 };
        let evidence = ApproachTriple {
            brute_force: Some(claimed("O(n^2)", "O(1)")),
            better: Some(claimed("O(n log n)", "O(1)")),
            optimal: Some(claimed("O(n)", "O(n)")),
        };
        let r = build(Some(gt), evidence, 0.5);
        assert_eq!(r.source, "ground_truth");
        assert!(r.solution.better.is_none());
        let optimal = r.solution.optimal.unwrap();
        assert_eq!(optimal.time_complexity, ComplexityClass::Linear);
        assert_eq!(optimal.space_complexity, ComplexityClass::Linear);
        assert_eq!(r.corrections.len(), 1);
        assert_eq!(r.corrections[0].approach, Approach::Better);
    }

    #[test]
    fn test_ground_truth_progression_holds() {
        let db = GroundTruthDb::builtin();
        for entry in db.entries() {
            let gt = GroundTruthMatch { entry, kind: MatchKind::Title, confidence: 1.0 };
            let evidence = ApproachTriple {
                brute_force: Some(claimed("O(1)", "O(1)")),
                better: Some(claimed("O(1)", "O(1)")),
                optimal: Some(claimed("O(n!)", "O(1)")),
            };
            let r = build(Some(gt), evidence, 0.5);
            let s = &r.solution;
            if let (Some(b), Some(o)) = (&s.brute_force, &s.optimal) {
                assert!(b.cost() >= o.cost(), "{}", entry.id);
                if let Some(m) = &s.better {
                    assert!(b.cost() > m.cost() && m.cost() > o.cost(), "{}", entry.id);
                }
            }
        }
    }
}

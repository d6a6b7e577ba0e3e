//! Analysis verdicts and the audit trail of corrections applied to them

use crate::complexity::ComplexityClass;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Peak working memory versus total memory including produced output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpaceMetrics {
    pub peak: ComplexityClass,
    pub total: ComplexityClass,
}

impl SpaceMetrics {
    pub fn flat(space: ComplexityClass) -> Self {
        SpaceMetrics { peak: space, total: space }
    }
}

/// Which snippet of a brute/better/optimal triple a correction applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Approach {
    Single,
    BruteForce,
    Better,
    Optimal,
}

impl Approach {
    pub fn as_str(&self) -> &'static str {
        match self {
            Approach::Single => "single",
            Approach::BruteForce => "brute_force",
            Approach::Better => "better",
            Approach::Optimal => "optimal",
        }
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Brute force, better and optimal variants of one solution, any of which may be absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApproachTriple<T> {
    #[serde(default)]
    pub brute_force: Option<T>,
    #[serde(default)]
    pub better: Option<T>,
    #[serde(default)]
    pub optimal: Option<T>,
}

impl<T> Default for ApproachTriple<T> {
    fn default() -> Self {
        ApproachTriple { brute_force: None, better: None, optimal: None }
    }
}

impl<T> ApproachTriple<T> {
    pub fn get(&self, approach: Approach) -> Option<&T> {
        match approach {
            Approach::BruteForce => self.brute_force.as_ref(),
            Approach::Better => self.better.as_ref(),
            Approach::Optimal | Approach::Single => self.optimal.as_ref(),
        }
    }

    /// Present slots, brute force first
    pub fn iter(&self) -> impl Iterator<Item = (Approach, &T)> {
        [
            (Approach::BruteForce, self.brute_force.as_ref()),
            (Approach::Better, self.better.as_ref()),
            (Approach::Optimal, self.optimal.as_ref()),
        ]
        .into_iter()
        .filter_map(|(a, v)| v.map(|v| (a, v)))
    }

    pub fn map<U>(self, mut f: impl FnMut(Approach, T) -> U) -> ApproachTriple<U> {
        ApproachTriple {
            brute_force: self.brute_force.map(|v| f(Approach::BruteForce, v)),
            better: self.better.map(|v| f(Approach::Better, v)),
            optimal: self.optimal.map(|v| f(Approach::Optimal, v)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.brute_force.is_none() && self.better.is_none() && self.optimal.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectedField {
    TimeComplexity,
    SpaceComplexity,
    /// An approach was added, removed or moved within a triple
    Presence,
}

/// One overwritten value and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub approach: Approach,
    pub field: CorrectedField,
    pub old_value: String,
    pub new_value: String,
    pub reason: String,
}

impl Correction {
    pub fn time(approach: Approach, old: impl ToString, new: impl ToString, reason: impl Into<String>) -> Self {
        Correction {
            approach,
            field: CorrectedField::TimeComplexity,
            old_value: old.to_string(),
            new_value: new.to_string(),
            reason: reason.into(),
        }
    }

    pub fn space(approach: Approach, old: impl ToString, new: impl ToString, reason: impl Into<String>) -> Self {
        Correction {
            approach,
            field: CorrectedField::SpaceComplexity,
            old_value: old.to_string(),
            new_value: new.to_string(),
            reason: reason.into(),
        }
    }

    pub fn presence(approach: Approach, old: impl ToString, new: impl ToString, reason: impl Into<String>) -> Self {
        Correction {
            approach,
            field: CorrectedField::Presence,
            old_value: old.to_string(),
            new_value: new.to_string(),
            reason: reason.into(),
        }
    }
}

/// One authoritative time and space verdict for a snippet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityResult {
    pub time_complexity: ComplexityClass,
    pub time_complexity_reason: String,
    pub space_complexity: ComplexityClass,
    pub space_complexity_reason: String,
    pub space_metrics: SpaceMetrics,
    pub pattern: Option<String>,
    pub confidence: f64,
    /// Layer that produced the verdict (`hazard:<name>`, `rule_engine`, `ground_truth`, ...)
    pub source: String,
    pub corrections_applied: Vec<Correction>,
}

impl ComplexityResult {
    pub fn new(
        time: ComplexityClass,
        time_reason: impl Into<String>,
        space: ComplexityClass,
        space_reason: impl Into<String>,
        source: impl Into<String>,
        confidence: f64,
    ) -> Self {
        ComplexityResult {
            time_complexity: time,
            time_complexity_reason: time_reason.into(),
            space_complexity: space,
            space_complexity_reason: space_reason.into(),
            space_metrics: SpaceMetrics::flat(space),
            pattern: None,
            confidence,
            source: source.into(),
            corrections_applied: Vec::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Conservative verdict used when the pipeline itself fails
    pub fn fallback() -> Self {
        ComplexityResult::new(
            ComplexityClass::Linear,
            "analysis failed; assuming a single pass",
            ComplexityClass::Constant,
            "analysis failed; assuming no auxiliary memory",
            "fallback",
            0.3,
        )
    }
}

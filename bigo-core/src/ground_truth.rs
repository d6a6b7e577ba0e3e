//! Ground truth database
//!
//! Curated per-problem complexity records, the highest-authority layer.
//! The built-in dataset is embedded at compile time and validated into a
//! strict typed table on first use; callers can inject their own table or
//! append entries from an extra dataset file.
//!
//! Lookup tries normalized title equality first, then fingerprint overlap:
//! the share of an entry's fingerprint tokens found in the snippet's own
//! fingerprint (normalized identifiers plus `#shape` tokens). A fingerprint
//! match also needs at least one salient token: shape tokens and everyday
//! names like `mid` or `head` never identify a problem on their own.

use crate::complexity::{ComplexityClass, ParseComplexityError};
use crate::features::{loops, structures};
use crate::result::{Approach, ApproachTriple};
use crate::source::{isolate, normalize_ident, re, Source};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, OnceLock};

const BUILTIN_DATASET: &str = include_str!("../data/ground_truth.json");

pub const DEFAULT_FINGERPRINT_THRESHOLD: f64 = 0.5;

/// Identifiers common to unrelated solutions
const GENERIC_TOKENS: &[&str] = &[
    "i", "j", "k", "n", "m", "x", "left", "right", "lo", "hi", "low", "high", "mid", "target",
    "prev", "curr", "cur", "current", "head", "tail", "node", "root", "max", "min", "count",
    "result", "res", "ans", "dp", "memo", "seen", "path", "start", "end", "key", "val", "value",
    "index", "idx", "total", "temp", "tmp", "nums", "arr", "visited", "depth",
];

/// A fingerprint token that can tell one problem from another
pub fn is_salient(token: &str) -> bool {
    !token.starts_with('#') && !GENERIC_TOKENS.contains(&token)
}

#[derive(Debug, thiserror::Error)]
pub enum GroundTruthError {
    #[error("failed to parse ground truth dataset")]
    Parse(#[from] serde_json::Error),

    #[error("entry {id:?}: {approach} {field} complexity is invalid")]
    InvalidComplexity {
        id: String,
        approach: Approach,
        field: &'static str,
        #[source]
        error: ParseComplexityError,
    },

    #[error("duplicate entry id {0:?}")]
    DuplicateId(String),

    #[error("entry {0:?} has no optimal approach")]
    MissingOptimal(String),

    #[error("entry {0:?} fingerprint has only generic tokens")]
    GenericFingerprint(String),

    #[error("entry {0:?} declares a better approach without an optimization ladder")]
    LadderViolation(String),

    #[error("entry {id:?}: {slower} ({slower_cost}) must not be cheaper than {faster} ({faster_cost})")]
    Ordering {
        id: String,
        slower: Approach,
        slower_cost: String,
        faster: Approach,
        faster_cost: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDataset {
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    id: String,
    titles: Vec<String>,
    #[serde(default)]
    fingerprint: Vec<String>,
    #[serde(default)]
    brute_force: Option<RawApproach>,
    #[serde(default)]
    better: Option<RawApproach>,
    #[serde(default)]
    optimal: Option<RawApproach>,
    #[serde(default = "default_ladder")]
    has_optimization_ladder: bool,
    #[serde(default)]
    note: String,
}

fn default_ladder() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawApproach {
    time: String,
    space: String,
    algorithm: String,
    #[serde(default)]
    reason: Option<String>,
}

/// One known solution approach
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnownApproach {
    pub time: ComplexityClass,
    pub space: ComplexityClass,
    pub algorithm: String,
    pub reason: Option<String>,
}

impl KnownApproach {
    /// Ordering key: time first, space breaks ties
    pub fn cost(&self) -> (ComplexityClass, ComplexityClass) {
        (self.time, self.space)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundTruthEntry {
    pub id: String,
    /// Normalized title patterns
    pub titles: Vec<String>,
    pub fingerprint: BTreeSet<String>,
    pub brute_force: Option<KnownApproach>,
    pub better: Option<KnownApproach>,
    pub optimal: KnownApproach,
    pub has_optimization_ladder: bool,
    pub note: String,
}

impl GroundTruthEntry {
    pub fn approaches(&self) -> ApproachTriple<&KnownApproach> {
        ApproachTriple {
            brute_force: self.brute_force.as_ref(),
            better: self.better.as_ref(),
            optimal: Some(&self.optimal),
        }
    }

    /// Present approaches as `(slot, approach)` pairs, brute force first
    pub fn iter(&self) -> impl Iterator<Item = (Approach, &KnownApproach)> {
        [
            (Approach::BruteForce, self.brute_force.as_ref()),
            (Approach::Better, self.better.as_ref()),
            (Approach::Optimal, Some(&self.optimal)),
        ]
        .into_iter()
        .filter_map(|(slot, a)| a.map(|a| (slot, a)))
    }

    /// Approach whose time class is nearest `time`; ties go to the faster one
    pub fn closest(&self, time: ComplexityClass) -> (Approach, &KnownApproach) {
        self.iter()
            .min_by_key(|(_, a)| (a.time.rank().abs_diff(time.rank()), a.time))
            .unwrap_or((Approach::Optimal, &self.optimal))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Title,
    Fingerprint,
}

#[derive(Debug, Clone, Copy)]
pub struct GroundTruthMatch<'a> {
    pub entry: &'a GroundTruthEntry,
    pub kind: MatchKind,
    pub confidence: f64,
}

/// Immutable table of validated entries
#[derive(Debug, Clone, Default)]
pub struct GroundTruthDb {
    entries: Vec<GroundTruthEntry>,
}

impl GroundTruthDb {
    /// Parse and validate a dataset document.
    pub fn from_json(json: &str) -> Result<Self, GroundTruthError> {
        let raw: RawDataset = serde_json::from_str(json)?;
        let mut db = GroundTruthDb::default();
        for entry in raw.entries {
            db.push(validate_entry(entry)?)?;
        }
        Ok(db)
    }

    /// The embedded dataset, parsed once per process.
    ///
    /// A dataset that fails validation leaves the table empty so analysis
    /// still runs on the remaining layers.
    pub fn builtin() -> Arc<GroundTruthDb> {
        static BUILTIN: OnceLock<Arc<GroundTruthDb>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| match GroundTruthDb::from_json(BUILTIN_DATASET) {
                Ok(db) => {
                    tracing::debug!(entries = db.len(), "loaded ground truth dataset");
                    Arc::new(db)
                }
                Err(e) => {
                    tracing::error!(error = %e, "embedded ground truth dataset is invalid");
                    Arc::new(GroundTruthDb::default())
                }
            })
            .clone()
    }

    /// This table followed by every entry of `extra`.
    pub fn merged(&self, extra: GroundTruthDb) -> Result<GroundTruthDb, GroundTruthError> {
        let mut db = self.clone();
        for entry in extra.entries {
            db.push(entry)?;
        }
        Ok(db)
    }

    fn push(&mut self, entry: GroundTruthEntry) -> Result<(), GroundTruthError> {
        if self.get(&entry.id).is_some() {
            return Err(GroundTruthError::DuplicateId(entry.id));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GroundTruthEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&GroundTruthEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entry whose normalized title equals `title`
    pub fn by_title(&self, title: &str) -> Option<&GroundTruthEntry> {
        let key = normalize_title(title);
        if key.is_empty() {
            return None;
        }
        self.entries.iter().find(|e| e.titles.iter().any(|t| *t == key))
    }

    /// Title match first, then the best fingerprint overlap of at least `threshold`.
    pub fn lookup(&self, src: &Source, title: Option<&str>, threshold: f64) -> Option<GroundTruthMatch<'_>> {
        if let Some(entry) = title.and_then(|t| self.by_title(t)) {
            tracing::debug!(id = %entry.id, "ground truth title match");
            return Some(GroundTruthMatch { entry, kind: MatchKind::Title, confidence: 1.0 });
        }
        if src.is_empty() {
            return None;
        }

        let tokens = fingerprint(src);
        let mut best: Option<(&GroundTruthEntry, f64)> = None;
        for entry in &self.entries {
            if entry.fingerprint.is_empty() {
                continue;
            }
            let hits: Vec<&String> = entry.fingerprint.iter().filter(|t| tokens.contains(*t)).collect();
            if !hits.iter().any(|t| is_salient(t)) {
                continue;
            }
            let overlap = hits.len() as f64 / entry.fingerprint.len() as f64;
            if overlap >= threshold && best.map_or(true, |(_, b)| overlap > b) {
                best = Some((entry, overlap));
            }
        }
        best.map(|(entry, overlap)| {
            tracing::debug!(id = %entry.id, overlap, "ground truth fingerprint match");
            GroundTruthMatch { entry, kind: MatchKind::Fingerprint, confidence: 0.95 }
        })
    }
}

/// Lowercase, drop a leading problem number, keep alphanumerics only.
///
/// `"1. Two Sum"`, `"two-sum"` and `"TwoSum"` all become `"twosum"`; a
/// number glued to the title (`"3Sum"`) is part of it.
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim_start();
    let after_digits = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
    let numbered = after_digits.len() != trimmed.len()
        && after_digits.starts_with(|c: char| matches!(c, '.' | ')' | ':' | '-') || c.is_whitespace());
    let rest = if numbered { after_digits } else { trimmed };
    rest.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Normalized identifiers of `src` plus structural `#shape` tokens
pub fn fingerprint(src: &Source) -> HashSet<String> {
    let mut tokens: HashSet<String> = src.identifiers().iter().cloned().collect();

    let scan = isolate("fingerprint_loops", Default::default, || loops::scan(src));
    let (ds, _) = isolate("fingerprint_structures", Default::default, || structures::detect(src));

    let mut shape = |present: bool, token: &str| {
        if present {
            tokens.insert(token.to_string());
        }
    };
    shape(!scan.loops.is_empty(), "#loop");
    shape(scan.max_depth() >= 2, "#nested");
    shape(src.functions().iter().any(|f| !src.self_calls(f).is_empty()), "#recursion");
    shape(ds.hash_map, "#hashmap");
    shape(ds.hash_set, "#hashset");
    shape(ds.heap, "#heap");
    shape(ds.stack, "#stack");
    shape(ds.queue, "#queue");
    shape(ds.linked_list, "#linkedlist");
    shape(ds.tree, "#tree");
    shape(ds.graph, "#graph");
    shape(
        src.is_match(re!(r"\bsorted\s*\(|\.sort\s*\(|\bsort\s*\(|\bArrays\.sort\b|\.sort_unstable\w*\s*\(")),
        "#sort",
    );
    tokens
}

fn validate_entry(raw: RawEntry) -> Result<GroundTruthEntry, GroundTruthError> {
    let id = raw.id;
    let approach = |slot: Approach, a: Option<RawApproach>| -> Result<Option<KnownApproach>, GroundTruthError> {
        let Some(a) = a else {
            return Ok(None);
        };
        let parse = |field: &'static str, value: &str| {
            value.parse::<ComplexityClass>().map_err(|error| GroundTruthError::InvalidComplexity {
                id: id.clone(),
                approach: slot,
                field,
                error,
            })
        };
        Ok(Some(KnownApproach {
            time: parse("time", &a.time)?,
            space: parse("space", &a.space)?,
            algorithm: a.algorithm,
            reason: a.reason,
        }))
    };

    let brute_force = approach(Approach::BruteForce, raw.brute_force)?;
    let better = approach(Approach::Better, raw.better)?;
    let optimal = approach(Approach::Optimal, raw.optimal)?.ok_or_else(|| GroundTruthError::MissingOptimal(id.clone()))?;

    if better.is_some() && !raw.has_optimization_ladder {
        return Err(GroundTruthError::LadderViolation(id));
    }

    let chain: Vec<(Approach, &KnownApproach)> = [
        (Approach::BruteForce, brute_force.as_ref()),
        (Approach::Better, better.as_ref()),
        (Approach::Optimal, Some(&optimal)),
    ]
    .into_iter()
    .filter_map(|(slot, a)| a.map(|a| (slot, a)))
    .collect();
    for pair in chain.windows(2) {
        let (slower, s) = pair[0];
        let (faster, f) = pair[1];
        if s.cost() < f.cost() {
            return Err(GroundTruthError::Ordering {
                id,
                slower,
                slower_cost: format!("{}/{}", s.time, s.space),
                faster,
                faster_cost: format!("{}/{}", f.time, f.space),
            });
        }
    }

    let fingerprint: BTreeSet<String> = raw
        .fingerprint
        .iter()
        .map(|t| match t.strip_prefix('#') {
            Some(shape) => format!("#{}", shape.to_lowercase()),
            None => normalize_ident(t),
        })
        .filter(|t| !t.is_empty() && t != "#")
        .collect();
    if !fingerprint.is_empty() && !fingerprint.iter().any(|t| is_salient(t)) {
        return Err(GroundTruthError::GenericFingerprint(id));
    }

    Ok(GroundTruthEntry {
        titles: raw.titles.iter().map(|t| normalize_title(t)).filter(|t| !t.is_empty()).collect(),
        fingerprint,
        brute_force,
        better,
        optimal,
        has_optimization_ladder: raw.has_optimization_ladder,
        note: raw.note,
        id,
    })
}

//! Feature extraction
//!
//! Turns a scrubbed `Source` into a `FeatureSet`: loop nesting and growth,
//! pointer motion, data structures, algorithm families and space usage.
//! Every sub-detector runs isolated; a panicking detector contributes its
//! empty default and the rest of the set is still produced.
//!
//! A `FeatureSet` is derived fresh per call and never mutated afterwards.

pub mod algorithms;
pub mod loops;
pub mod pointers;
pub mod space;
pub mod structures;

use crate::amortized;
use crate::language::Language;
use crate::source::{isolate, Source};
use serde::Serialize;
use std::collections::BTreeSet;

pub use loops::{LoopGrowth, LoopScan};

/// Loop shape summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoopFeatures {
    /// Loops at credited depth 1
    pub single_loops: usize,
    /// Loops at credited depth 2 or more
    pub nested_loops: usize,
    pub max_nesting_depth: usize,
    pub growth_type: LoopGrowth,
    pub bounds: BTreeSet<String>,
    /// Every loop exits on its first iteration
    pub early_exit: bool,
    pub total_loops: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PointerFeatures {
    pub two_pointers: bool,
    pub sliding_window: bool,
    pub left_right: bool,
    pub slow_fast: bool,
    /// No pointer is reset backwards inside a loop
    pub forward_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataStructures {
    pub hash_map: bool,
    pub hash_set: bool,
    pub array: bool,
    pub heap: bool,
    pub stack: bool,
    pub queue: bool,
    pub tree: bool,
    pub graph: bool,
    pub linked_list: bool,
    pub trie: bool,
    pub union_find: bool,
    pub string_builder: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlgorithmFeatures {
    pub sorting: bool,
    pub sort_in_loop: bool,
    pub binary_search: bool,
    pub binary_search_in_loop: bool,
    pub recursion: bool,
    pub recursion_in_loop: bool,
    pub memoization: bool,
    pub dp: bool,
    pub backtracking: bool,
    pub bfs: bool,
    pub dfs: bool,
    pub divide_conquer: bool,
    pub monotonic_stack: bool,
    pub sieve: bool,
    pub gcd: bool,
    pub is_permutation: bool,
    pub accumulates_results: bool,
    /// Heap built in one bottom-up pass (`heapify`, `make_heap`)
    pub heapify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpaceUsage {
    pub aux_arrays: usize,
    pub aux_maps: usize,
    pub in_place: bool,
    pub hidden_allocations: bool,
    /// Counting tables over a fixed alphabet (`[0] * 26`)
    pub fixed_key_domain: bool,
    pub string_concat_in_loop: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecursionArgs {
    #[default]
    Linear,
    /// Halved or sliced arguments
    Divide,
    /// `n - 1` style decrements
    Step,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureMetrics {
    pub recursion_branching: usize,
    pub dp_dimensions: u8,
    pub recursion_args: RecursionArgs,
    pub is_amortized: bool,
    pub dominant_pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureSet {
    pub loops: LoopFeatures,
    pub pointers: PointerFeatures,
    pub data_structures: DataStructures,
    pub algorithms: AlgorithmFeatures,
    pub space_usage: SpaceUsage,
    pub metrics: FeatureMetrics,
}

impl FeatureSet {
    /// Nothing at all was recognized
    pub fn is_featureless(&self) -> bool {
        let empty = FeatureSet::default();
        let p = &self.pointers;
        self.loops.total_loops == 0
            && !(p.two_pointers || p.sliding_window || p.left_right || p.slow_fast)
            && self.data_structures == empty.data_structures
            && self.algorithms == empty.algorithms
            && self.space_usage.aux_arrays == 0
            && self.space_usage.aux_maps == 0
            && !self.space_usage.hidden_allocations
    }
}

/// Extract features from raw code.
pub fn extract(code: &str, language: Language) -> FeatureSet {
    extract_from(&Source::new(code, language))
}

/// Extract features from an already scrubbed source.
pub fn extract_from(src: &Source) -> FeatureSet {
    let scan = isolate("loops", LoopScan::default, || loops::scan(src));
    let loop_features = loops::summarize(&scan);
    let pointers = isolate("pointers", PointerFeatures::default, || {
        pointers::detect(src, &scan)
    });
    let (data_structures, literals) = isolate("structures", Default::default, || {
        structures::detect(src)
    });
    let (algorithms, recursion) = isolate("algorithms", Default::default, || {
        algorithms::detect(src, &scan, &data_structures)
    });
    let space_usage = isolate("space", SpaceUsage::default, || {
        space::detect(src, &scan, &data_structures, &literals)
    });
    let amortized = isolate("amortized", || None, || amortized::detect_in(src, &scan));

    let mut features = FeatureSet {
        loops: loop_features,
        pointers,
        data_structures,
        algorithms,
        space_usage,
        metrics: FeatureMetrics {
            recursion_branching: recursion.branching,
            dp_dimensions: recursion.dp_dimensions,
            recursion_args: recursion.args,
            is_amortized: amortized.is_some() || scan.loops.iter().any(|l| l.amortized.is_some()),
            dominant_pattern: None,
        },
    };
    features.metrics.dominant_pattern = amortized
        .map(|a| a.pattern.to_string())
        .or_else(|| dominant_pattern(&features).map(str::to_string));

    tracing::debug!(
        loops = features.loops.total_loops,
        depth = features.loops.max_nesting_depth,
        pattern = features.metrics.dominant_pattern.as_deref().unwrap_or("-"),
        "features extracted"
    );
    features
}

/// Most specific algorithm family present, in rough specificity order.
fn dominant_pattern(f: &FeatureSet) -> Option<&'static str> {
    let a = &f.algorithms;
    let ordered = [
        (a.backtracking, "backtracking"),
        (a.divide_conquer, "divide_and_conquer"),
        (a.dp || a.memoization, "dynamic_programming"),
        (a.sieve, "sieve"),
        (a.binary_search, "binary_search"),
        (a.bfs, "bfs"),
        (a.dfs, "dfs"),
        (a.monotonic_stack, "monotonic_stack"),
        (f.pointers.sliding_window, "sliding_window"),
        (f.pointers.two_pointers, "two_pointers"),
        (a.sorting, "sorting"),
        (f.data_structures.heap, "heap"),
        (a.gcd, "gcd"),
        (a.recursion, "recursion"),
        (f.data_structures.hash_map || f.data_structures.hash_set, "hashing"),
        (f.loops.max_nesting_depth >= 2, "nested_loops"),
        (f.loops.max_nesting_depth == 1, "single_loop"),
    ];
    ordered.iter().find(|(hit, _)| *hit).map(|(_, name)| *name)
}

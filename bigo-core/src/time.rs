//! Time complexity rule engine
//!
//! Every recognized feature contributes candidates tagged with a source.
//! Sources split into a priority set (specific algorithm families) and a
//! generic set (raw loop depth, plain recursion, hashing). When any
//! priority candidate exists the highest priority candidate wins, even if a
//! generic candidate ranks above it; otherwise the highest candidate wins.
//! Ties keep the candidate produced first.

use crate::complexity::ComplexityClass;
use crate::features::{FeatureSet, LoopGrowth, RecursionArgs};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    EarlyExit,
    /// Backtracking recursion launched from a loop
    EnumerationInLoop,
    SortInLoop,
    StringConcatInLoop,
    Sieve,
    DivideConquer,
    GraphTraversal,
    BinarySearch,
    MonotonicStack,
    SlidingWindow,
    Heap,
    Sorting,
    Backtracking,
    RecursionInLoop,
    TreeRecursion,
    Recursion,
    Gcd,
    Loops,
    HashUsage,
    TwoPointers,
    DynamicProgramming,
}

impl CandidateSource {
    pub fn id(&self) -> &'static str {
        match self {
            CandidateSource::EarlyExit => "early_exit",
            CandidateSource::EnumerationInLoop => "enumeration_in_loop",
            CandidateSource::SortInLoop => "sort_in_loop",
            CandidateSource::StringConcatInLoop => "string_concat_in_loop",
            CandidateSource::Sieve => "sieve",
            CandidateSource::DivideConquer => "divide_conquer",
            CandidateSource::GraphTraversal => "graph_traversal",
            CandidateSource::BinarySearch => "binary_search",
            CandidateSource::MonotonicStack => "monotonic_stack",
            CandidateSource::SlidingWindow => "sliding_window",
            CandidateSource::Heap => "heap",
            CandidateSource::Sorting => "sorting",
            CandidateSource::Backtracking => "backtracking",
            CandidateSource::RecursionInLoop => "recursion_in_loop",
            CandidateSource::TreeRecursion => "tree_recursion",
            CandidateSource::Recursion => "recursion",
            CandidateSource::Gcd => "gcd",
            CandidateSource::Loops => "loops",
            CandidateSource::HashUsage => "hash_usage",
            CandidateSource::TwoPointers => "two_pointers",
            CandidateSource::DynamicProgramming => "dynamic_programming",
        }
    }

    pub fn is_priority(&self) -> bool {
        !matches!(
            self,
            CandidateSource::RecursionInLoop
                | CandidateSource::TreeRecursion
                | CandidateSource::Recursion
                | CandidateSource::Gcd
                | CandidateSource::Loops
                | CandidateSource::HashUsage
                | CandidateSource::TwoPointers
                | CandidateSource::DynamicProgramming
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub source: CandidateSource,
    pub complexity: ComplexityClass,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeVerdict {
    pub complexity: ComplexityClass,
    pub explanation: String,
    /// Winning source, `None` when nothing contributed
    pub source: Option<CandidateSource>,
    pub candidates: Vec<Candidate>,
}

pub fn derive_time(f: &FeatureSet) -> TimeVerdict {
    let candidates = candidates(f);
    let winner = select(&candidates).cloned();

    match winner {
        Some(c) => {
            tracing::debug!(
                source = c.source.id(),
                complexity = %c.complexity,
                candidates = candidates.len(),
                "time candidate selected"
            );
            TimeVerdict {
                complexity: c.complexity,
                explanation: c.explanation,
                source: Some(c.source),
                candidates,
            }
        }
        None => TimeVerdict {
            complexity: ComplexityClass::Constant,
            explanation: if f.is_featureless() {
                "nothing recognizable in the snippet".to_string()
            } else {
                "no loops, recursion or library work detected".to_string()
            },
            source: None,
            candidates,
        },
    }
}

/// Highest priority candidate if any exists, else the highest overall.
pub fn select(candidates: &[Candidate]) -> Option<&Candidate> {
    fn highest<'a>(pool: Vec<&'a Candidate>) -> Option<&'a Candidate> {
        pool.into_iter()
            .reduce(|best, c| if c.complexity > best.complexity { c } else { best })
    }
    let priority: Vec<&Candidate> = candidates.iter().filter(|c| c.source.is_priority()).collect();
    if priority.is_empty() {
        highest(candidates.iter().collect())
    } else {
        highest(priority)
    }
}

fn candidates(f: &FeatureSet) -> Vec<Candidate> {
    use CandidateSource as S;
    use ComplexityClass as C;

    let a = &f.algorithms;
    let ds = &f.data_structures;
    let has_loops = f.loops.total_loops > 0;
    let mut out = Vec::new();
    let mut push = |source: CandidateSource, complexity: ComplexityClass, why: &str| {
        out.push(Candidate { source, complexity, explanation: why.to_string() });
    };

    if f.loops.early_exit && !a.recursion {
        push(S::EarlyExit, C::Constant, "every loop exits on its first iteration");
        return out;
    }

    if a.recursion_in_loop {
        if a.backtracking {
            if a.is_permutation {
                push(S::EnumerationInLoop, C::Factorial, "recursion from a loop enumerates every permutation");
            } else if f.metrics.recursion_branching >= 2 {
                push(S::EnumerationInLoop, C::NExponential, "branching recursion from a loop enumerates every subset");
            } else {
                push(S::EnumerationInLoop, C::Quadratic, "recursion from a loop over the remaining choices");
            }
        } else {
            push(S::RecursionInLoop, C::Quadratic, "recursive call inside a loop");
        }
    }
    if a.sort_in_loop {
        push(S::SortInLoop, C::QuadraticLog, "sort called once per loop iteration");
    }
    if f.space_usage.string_concat_in_loop {
        push(S::StringConcatInLoop, C::Quadratic, "immutable string rebuilt on every iteration");
    }
    if a.sieve {
        push(S::Sieve, C::NLogLogN, "sieve marks multiples starting at each prime's square");
    }
    if a.divide_conquer {
        let combines = has_loops || f.space_usage.hidden_allocations || f.space_usage.aux_arrays > 0;
        if combines {
            push(S::DivideConquer, C::NLogN, "halving recursion with a linear combine step");
        } else {
            push(S::DivideConquer, C::Linear, "halving recursion with constant combine work");
        }
    }
    if a.bfs || a.dfs {
        if ds.graph {
            push(S::GraphTraversal, C::VPlusE, "graph traversal visits each vertex and edge once");
        } else {
            push(S::GraphTraversal, C::Linear, "traversal visits each node once");
        }
    }
    if a.binary_search {
        if a.binary_search_in_loop {
            push(S::BinarySearch, C::NLogN, "binary search repeated inside a loop");
        } else {
            push(S::BinarySearch, C::Log, "search range halves every step");
        }
    }
    if a.monotonic_stack {
        push(S::MonotonicStack, C::Linear, "each element is pushed and popped at most once");
    }
    if f.pointers.sliding_window && f.pointers.forward_only {
        push(S::SlidingWindow, C::Linear, "window edges only move forward");
    }
    if ds.heap {
        if has_loops {
            push(S::Heap, C::NLogN, "logarithmic heap operations inside a loop");
        } else if a.heapify {
            push(S::Heap, C::Linear, "heapify builds the heap bottom-up in linear time");
        } else {
            push(S::Heap, C::Log, "single heap operation");
        }
    }
    if a.sorting {
        push(S::Sorting, C::NLogN, "comparison sort");
    }
    if a.backtracking {
        if a.is_permutation {
            push(S::Backtracking, C::Factorial, "backtracking over permutations");
        } else if a.accumulates_results {
            push(S::Backtracking, C::NExponential, "backtracking copies every subset into the output");
        } else {
            push(S::Backtracking, C::Exponential, "backtracking explores every include/exclude choice");
        }
    }

    if f.metrics.recursion_branching >= 2 {
        push(S::TreeRecursion, C::Exponential, "each call branches into several recursive calls");
    } else if a.recursion {
        if a.gcd {
            push(S::Gcd, C::Log, "Euclid's algorithm shrinks its arguments geometrically");
        } else if f.metrics.recursion_args == RecursionArgs::Divide {
            push(S::Recursion, C::Log, "single recursive call on half the input");
        } else {
            push(S::Recursion, C::Linear, "single recursive call on a slightly smaller input");
        }
    }

    let depth = f.loops.max_nesting_depth;
    if depth > 0 {
        let (complexity, why) = match f.loops.growth_type {
            LoopGrowth::Linear => (
                C::polynomial(depth),
                match depth {
                    1 => "single loop over the input",
                    2 => "two nested loops over the input",
                    _ => "three or more nested loops over the input",
                },
            ),
            LoopGrowth::Logarithmic => match depth {
                1 => (C::Log, "loop variable grows or shrinks geometrically"),
                2 => (C::NLogN, "geometric loop nested in a linear loop"),
                3 => (C::QuadraticLog, "geometric loop nested in two linear loops"),
                _ => (C::Cubic, "deeply nested loops"),
            },
            LoopGrowth::Sqrt => match depth {
                1 => (C::Sqrt, "loop runs up to the square root of n"),
                _ => (C::polynomial(depth), "nested loops over the input"),
            },
        };
        push(S::Loops, complexity, why);
    } else if a.gcd {
        push(S::Gcd, C::Log, "Euclid's algorithm shrinks its arguments geometrically");
    }

    if ds.hash_map || ds.hash_set {
        if has_loops {
            push(S::HashUsage, C::Linear, "constant-time hash lookups inside a single pass");
        } else {
            push(S::HashUsage, C::Constant, "constant-time hash lookups");
        }
    }
    if f.pointers.two_pointers && !f.pointers.sliding_window {
        push(S::TwoPointers, C::Linear, "pointers walk the input once");
    }
    if a.dp || a.memoization {
        if f.metrics.dp_dimensions >= 2 {
            push(S::DynamicProgramming, C::Quadratic, "two-dimensional state table");
        } else {
            push(S::DynamicProgramming, C::Linear, "one state per input position");
        }
    }

    out
}

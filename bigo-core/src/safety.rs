//! Safety layer
//!
//! An ordered table of clamps applied to rule-engine output. Each clamp
//! checks one domain constraint (a sort is never exponential, a DP table is
//! polynomial, a forward-only window is linear) and rewrites the time
//! verdict when it is violated, recording a `Correction`. Every clamp's
//! output satisfies its own guard, so `verify` is idempotent.

use crate::complexity::ComplexityClass;
use crate::features::FeatureSet;
use crate::result::{Approach, ComplexityResult, Correction};

pub struct Clamp {
    pub name: &'static str,
    /// New time class and reason, when the current one violates the rule
    check: fn(ComplexityClass, &FeatureSet) -> Option<(ComplexityClass, &'static str)>,
}

pub static CLAMPS: &[Clamp] = &[
    Clamp { name: "known_domain_ceiling", check: domain_ceiling },
    Clamp { name: "dp_is_polynomial", check: dp_polynomial },
    Clamp { name: "linear_window", check: linear_window },
];

/// Apply every clamp in order.
pub fn verify(mut result: ComplexityResult, features: &FeatureSet) -> ComplexityResult {
    for clamp in CLAMPS {
        let current = result.time_complexity;
        let Some((clamped, reason)) = (clamp.check)(current, features) else {
            continue;
        };
        if clamped == current {
            continue;
        }
        tracing::debug!(clamp = clamp.name, from = %current, to = %clamped, "safety clamp");
        result.corrections_applied.push(Correction::time(Approach::Single, current, clamped, reason));
        result.time_complexity = clamped;
        result.time_complexity_reason = reason.to_string();
    }
    result
}

/// Exponential output without a real backtracking structure is capped at the
/// slowest recognized non-exponential domain.
fn domain_ceiling(time: ComplexityClass, f: &FeatureSet) -> Option<(ComplexityClass, &'static str)> {
    let a = &f.algorithms;
    if !time.is_exponential() || a.backtracking || !a.recursion {
        return None;
    }
    let mut ceilings = Vec::new();
    if a.sorting || a.divide_conquer {
        ceilings.push(ComplexityClass::NLogN);
    }
    if a.binary_search {
        ceilings.push(if a.binary_search_in_loop {
            ComplexityClass::NLogN
        } else {
            ComplexityClass::Log
        });
    }
    if a.bfs || a.dfs {
        ceilings.push(if f.data_structures.graph {
            ComplexityClass::VPlusE
        } else {
            ComplexityClass::Linear
        });
    }
    ceilings.into_iter().max().map(|c| {
        (c, "sorting, searching and traversal are never exponential without backtracking")
    })
}

fn dp_polynomial(time: ComplexityClass, f: &FeatureSet) -> Option<(ComplexityClass, &'static str)> {
    let a = &f.algorithms;
    if !time.is_exponential() || !(a.dp || a.memoization) {
        return None;
    }
    Some(if f.metrics.dp_dimensions >= 2 {
        (ComplexityClass::Quadratic, "memoized state space is two-dimensional")
    } else {
        (ComplexityClass::Linear, "memoized state space is one-dimensional")
    })
}

fn linear_window(time: ComplexityClass, f: &FeatureSet) -> Option<(ComplexityClass, &'static str)> {
    let p = &f.pointers;
    let a = &f.algorithms;
    let forward = p.sliding_window || (p.two_pointers && p.forward_only);
    let other_domain = a.sorting || a.binary_search || f.data_structures.heap;
    if !forward || other_domain || time == ComplexityClass::Linear {
        return None;
    }
    Some((ComplexityClass::Linear, "pointers only move forward, so each index is visited a constant number of times"))
}

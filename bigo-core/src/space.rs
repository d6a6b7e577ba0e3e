//! Space complexity rule engine
//!
//! Contributions only ever raise the verdict. The working-set figure is the
//! peak; enumerations that materialize every answer also report the size of
//! that output as the total, which becomes the headline figure.

use crate::complexity::ComplexityClass;
use crate::features::{FeatureSet, RecursionArgs};
use crate::result::SpaceMetrics;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceVerdict {
    pub complexity: ComplexityClass,
    pub explanation: String,
    pub metrics: SpaceMetrics,
}

/// Running maximum that remembers the first reason for the current value
struct Peak {
    class: ComplexityClass,
    why: String,
}

impl Peak {
    fn raise(&mut self, class: ComplexityClass, why: &str) {
        if class > self.class {
            self.class = class;
            self.why = why.to_string();
        }
    }
}

pub fn derive_space(f: &FeatureSet) -> SpaceVerdict {
    use ComplexityClass as C;

    let a = &f.algorithms;
    let ds = &f.data_structures;
    let usage = &f.space_usage;
    let bounded = f.pointers.sliding_window || usage.fixed_key_domain;

    let mut peak = Peak { class: C::Constant, why: "in-place; only scalar variables".to_string() };

    if usage.hidden_allocations {
        peak.raise(C::Linear, "slicing or copying allocates a new sequence");
    }
    if usage.aux_arrays > 0 {
        peak.raise(C::Linear, "auxiliary array proportional to the input");
    }
    if usage.aux_maps > 0 || ds.hash_map || ds.hash_set {
        if bounded {
            peak.raise(C::BoundedK, "hash table over a bounded key set");
        } else {
            peak.raise(C::Linear, "hash table holding up to n entries");
        }
    }
    if usage.fixed_key_domain {
        peak.raise(C::BoundedK, "counting table over a fixed alphabet");
    }
    if ds.heap {
        peak.raise(C::Linear, "heap holding up to n elements");
    }
    if ds.queue {
        if f.pointers.sliding_window {
            peak.raise(C::BoundedK, "queue bounded by the window size");
        } else {
            peak.raise(C::Linear, "queue holding up to n elements");
        }
    }
    if ds.stack {
        peak.raise(C::Linear, "stack holding up to n elements");
    }
    if a.dp || a.memoization {
        if f.metrics.dp_dimensions >= 2 {
            peak.raise(C::Quadratic, "two-dimensional DP table");
        } else {
            peak.raise(C::Linear, "one-dimensional DP table or memo");
        }
    }
    if a.recursion {
        let halving = a.divide_conquer
            || a.binary_search
            || a.gcd
            || f.metrics.recursion_args == RecursionArgs::Divide;
        if halving {
            peak.raise(C::Log, "recursion depth is logarithmic");
        } else {
            peak.raise(C::Linear, "recursion stack up to n frames deep");
        }
    }

    let output = if a.backtracking && a.accumulates_results {
        if a.is_permutation {
            Some((C::NFactorial, "output holds all n! permutations of length n"))
        } else {
            Some((C::NExponential, "output holds all 2^n subsets of length up to n"))
        }
    } else {
        None
    };

    let metrics = SpaceMetrics {
        peak: peak.class,
        total: output.map_or(peak.class, |(c, _)| c.max(peak.class)),
    };
    let (complexity, explanation) = match output {
        Some((c, why)) if c > peak.class => (c, why.to_string()),
        _ => (peak.class, peak.why),
    };

    tracing::debug!(%complexity, peak = %metrics.peak, "space verdict");
    SpaceVerdict { complexity, explanation, metrics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extract;
    use crate::language::Language;

    #[test]
    fn test_no_features_is_in_place() {
        let v = derive_space(&FeatureSet::default());
        assert_eq!(v.complexity, ComplexityClass::Constant);
        assert!(v.explanation.contains("in-place"));
        assert_eq!(v.metrics, SpaceMetrics::flat(ComplexityClass::Constant));
    }

    #[test]
    fn test_hash_map_is_linear() {
        let f = extract(
            "def two_sum(nums, t):\n    seen = {}\n    for i, x in enumerate(nums):\n        if t - x in seen:\n            return [seen[t - x], i]\n        seen[x] = i\n",
            Language::Python,
        );
        assert_eq!(derive_space(&f).complexity, ComplexityClass::Linear);
    }

    #[test]
    fn test_fixed_alphabet_is_bounded() {
        let f = extract(
            "def anagram(s, t):\n    count = [0] * 26\n    for c in s:\n        count[ord(c) - ord('a')] += 1\n    return count\n",
            Language::Python,
        );
        assert_eq!(derive_space(&f).complexity, ComplexityClass::BoundedK);
    }

    #[test]
    fn test_two_dimensional_dp() {
        let mut f = FeatureSet::default();
        f.algorithms.dp = true;
        f.metrics.dp_dimensions = 2;
        assert_eq!(derive_space(&f).complexity, ComplexityClass::Quadratic);
    }

    #[test]
    fn test_recursion_depth() {
        let mut f = FeatureSet::default();
        f.algorithms.recursion = true;
        assert_eq!(derive_space(&f).complexity, ComplexityClass::Linear);

        f.algorithms.binary_search = true;
        assert_eq!(derive_space(&f).complexity, ComplexityClass::Log);
    }

    #[test]
    fn test_accumulated_permutations_report_total() {
        let mut f = FeatureSet::default();
        f.algorithms.recursion = true;
        f.algorithms.backtracking = true;
        f.algorithms.is_permutation = true;
        f.algorithms.accumulates_results = true;
        let v = derive_space(&f);
        assert_eq!(v.complexity, ComplexityClass::NFactorial);
        assert_eq!(v.metrics.peak, ComplexityClass::Linear);
        assert_eq!(v.metrics.total, ComplexityClass::NFactorial);
    }
}

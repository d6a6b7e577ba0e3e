//! Amortized pattern detector
//!
//! Recognizes loop nests whose naive depth overstates the work because an
//! inner pointer or stack only ever moves forward: monotonic stacks and
//! queues, shrinking sliding windows (with or without a hash window) and
//! converging two pointers. The extractor consumes the same loop marks to
//! demote nested-loop credit; the engine also runs this detector on its own
//! as a cross-check layer ranked below the rule engines.

use crate::complexity::ComplexityClass;
use crate::features::loops::{self, LoopScan};
use crate::language::Language;
use crate::shapes::{self, Amortization};
use crate::source::{re, Source};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmortizedVerdict {
    pub pattern: &'static str,
    pub time: ComplexityClass,
    pub space: ComplexityClass,
    pub reason: String,
}

pub fn detect(code: &str, language: Language) -> Option<AmortizedVerdict> {
    let src = Source::new(code, language);
    let scan = loops::scan(&src);
    detect_in(&src, &scan)
}

pub fn detect_in(src: &Source, scan: &LoopScan) -> Option<AmortizedVerdict> {
    if let Some(lp) = scan
        .loops
        .iter()
        .find(|l| l.amortized == Some(Amortization::StackDrain))
    {
        let deque = re!(r"(?i)\bdeque\b|\bdq\b|\.popleft\(|\bArrayDeque\b|\bVecDeque\b|\.pop_front\(|\.pollFirst\(")
            .is_match(&lp.condition)
            || src.is_match(re!(r"(?i)\bdeque\b|\.popleft\(|\.pop_front\(|\.pollFirst\(|\.shift\(\)"));
        return Some(if deque {
            AmortizedVerdict {
                pattern: "monotonic_queue",
                time: ComplexityClass::Linear,
                space: ComplexityClass::BoundedK,
                reason: "each index enters and leaves the deque at most once".to_string(),
            }
        } else {
            AmortizedVerdict {
                pattern: "monotonic_stack",
                time: ComplexityClass::Linear,
                space: ComplexityClass::Linear,
                reason: "each element is pushed and popped at most once".to_string(),
            }
        });
    }

    if scan
        .loops
        .iter()
        .any(|l| l.amortized == Some(Amortization::WindowShrink))
    {
        let hashed = src.is_match(re!(
            r"\b(?:HashMap|HashSet|unordered_map|unordered_set|Counter|defaultdict|dict|set|Map|Set)\b|\bmap\[|\w+\s*=\s*\{\s*\}"
        ));
        return Some(if hashed {
            AmortizedVerdict {
                pattern: "hash_window",
                time: ComplexityClass::Linear,
                space: ComplexityClass::BoundedK,
                reason: "window edges only advance; the window table holds at most k keys".to_string(),
            }
        } else {
            AmortizedVerdict {
                pattern: "sliding_window",
                time: ComplexityClass::Linear,
                space: ComplexityClass::Constant,
                reason: "both window edges only advance".to_string(),
            }
        });
    }

    let converging = scan.loops.iter().enumerate().any(|(idx, lp)| {
        lp.parent.is_none() && !scan.has_child(idx) && shapes::is_converging(src, lp)
    });
    converging.then(|| AmortizedVerdict {
        pattern: "two_pointer",
        time: ComplexityClass::Linear,
        space: ComplexityClass::Constant,
        reason: "two pointers converge; each step moves one of them".to_string(),
    })
}

//! Amortized loop shapes
//!
//! Inner loops whose total work over the whole outer loop is linear:
//! monotonic stack/queue drains and sliding-window shrinks. The loop scanner
//! uses these to withhold nesting credit; the amortized detector uses the
//! same predicates to report a verdict of its own.

use crate::features::loops::{LoopInfo, LoopKind};
use crate::source::{re, Source};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Amortization {
    /// `while stack and stack[-1] < x: stack.pop()` inside a loop
    StackDrain,
    /// `while window_invalid: left += 1` inside a loop over `right`
    WindowShrink,
}

/// Identifiers that name the trailing edge of a window
const TRAILING_POINTERS: &[&str] = &[
    "left", "l", "lo", "low", "start", "begin", "slow", "tail", "head", "i", "j", "p", "ptr",
    "windowstart", "winstart",
];

pub fn mark_amortized(src: &Source, loops: &mut [LoopInfo]) {
    for idx in 0..loops.len() {
        let Some(parent) = loops[idx].parent else {
            continue;
        };
        if loops[idx].kind != LoopKind::While {
            continue;
        }
        let kind = if is_stack_drain(src, &loops[idx]) {
            Some(Amortization::StackDrain)
        } else if is_window_shrink(src, &loops[idx], &loops[parent]) {
            Some(Amortization::WindowShrink)
        } else {
            None
        };
        loops[idx].amortized = kind;
    }
}

/// Condition peeks at the top of a stack-like container and the body pops it.
pub fn is_stack_drain(src: &Source, lp: &LoopInfo) -> bool {
    let cond = &lp.condition;
    let container = re!(r"(?i)\b\w*(?:stack|stk|mono|deque|queue)\w*\b|\b(?:st|dq|q)\b").is_match(cond);
    let peeks = re!(
        r"\[\s*-\s*1\s*\]|\[\s*0\s*\]|\.(?:peek|top|last|back|peekLast|peekFirst|getLast|front|first)\s*\(|len\(\s*\w+\s*\)\s*-\s*1\s*\]|\.length\s*-\s*1\s*\]|\.size\(\)\s*-\s*1"
    )
    .is_match(cond);
    if !(container && peeks) {
        return false;
    }
    std::iter::once(lp.line)
        .chain(lp.body())
        .any(|i| {
            re!(
                r"\.(?:pop|pop_back|popBack|pollLast|pollFirst|removeLast|removeFirst|popleft|pop_front|shift)\s*\(|=\s*\w+\[\s*:\s*len\(\s*\w+\s*\)\s*-\s*1\s*\]"
            )
            .is_match(src.line(i))
        })
}

/// A trailing pointer advances inside the inner loop and is never reset by
/// the enclosing loop.
pub fn is_window_shrink(src: &Source, lp: &LoopInfo, parent: &LoopInfo) -> bool {
    let inner: BTreeSet<String> = std::iter::once(lp.line)
        .chain(lp.body())
        .flat_map(|i| advanced_names(src.line(i)))
        .collect();

    let candidates: Vec<&String> = inner
        .iter()
        .filter(|name| TRAILING_POINTERS.contains(&name.to_lowercase().replace('_', "").as_str()))
        .filter(|name| parent.var.as_deref() != Some(name.as_str()))
        .collect();

    let outer: Vec<&str> = parent.var.as_deref().into_iter().collect();
    candidates.iter().any(|name| {
        !parent
            .body()
            .filter(|i| !(lp.line..=lp.end).contains(i))
            .any(|i| assigns_fresh(src.line(i), name, &outer))
    })
}

/// Two pointers walk toward each other in one non-nested loop.
pub fn is_converging(src: &Source, lp: &LoopInfo) -> bool {
    if !matches!(lp.kind, LoopKind::While | LoopKind::For) {
        return false;
    }
    let Some(c) = re!(r"\b([A-Za-z_]\w*)\s*<=?\s*([A-Za-z_]\w*)\b").captures(&lp.condition) else {
        return false;
    };
    let (low, high) = (&c[1], &c[2]);
    if low == high {
        return false;
    }
    let body: Vec<&str> = lp.body().map(|i| src.line(i)).collect();
    let halves = body.iter().any(|t| is_midpoint(t));
    let advances = body.iter().any(|t| advanced_names(t).iter().any(|n| n == low));
    let retreats = body.iter().any(|t| retreated_names(t).iter().any(|n| n == high));
    advances && retreats && !halves
}

/// `mid = (lo + hi) / 2` and its spellings
pub fn is_midpoint(text: &str) -> bool {
    re!(r"\b\w+\s*:?=\s*[^=;]*\w\s*[+-]\s*[^=;]*(?:/\s*2\b|//\s*2\b|>>>?\s*1\b)").is_match(text)
}

/// Variable assigned a halved value: `center = (lo + hi) // 2`, `m = n >> 1`
pub fn midpoint_name(text: &str) -> Option<String> {
    re!(r"\b(\w+)\s*:?=\s*[^=;]*(?:/\s*2\b|>>>?\s*1\b)")
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Names incremented by one: `x += 1`, `x++`, `++x`, `x = x + 1`
pub fn advanced_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for c in re!(r"\b(\w+)\s*\+=\s*1\b|\b(\w+)\s*\+\+|\+\+\s*(\w+)\b|\b(\w+)\s*=\s*(\w+)\s*\+\s*1\b")
        .captures_iter(text)
    {
        if let Some(m) = c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)) {
            names.push(m.as_str().to_string());
        } else if let (Some(a), Some(b)) = (c.get(4), c.get(5)) {
            if a.as_str() == b.as_str() {
                names.push(a.as_str().to_string());
            }
        }
    }
    names
}

/// Names decremented by one: `x -= 1`, `x--`, `--x`, `x = x - 1`
pub fn retreated_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for c in re!(r"\b(\w+)\s*-=\s*1\b|\b(\w+)\s*--|--\s*(\w+)\b|\b(\w+)\s*=\s*(\w+)\s*-\s*1\b")
        .captures_iter(text)
    {
        if let Some(m) = c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)) {
            names.push(m.as_str().to_string());
        } else if let (Some(a), Some(b)) = (c.get(4), c.get(5)) {
            if a.as_str() == b.as_str() {
                names.push(a.as_str().to_string());
            }
        }
    }
    names
}

/// `name` is assigned a value that does not derive from itself: a literal,
/// or an expression over an enclosing loop variable (`left = i + 1`).
fn assigns_fresh(text: &str, name: &str, loop_vars: &[&str]) -> bool {
    let derived_from = |rhs: &str, word: &str| {
        re!(r"\b\w+\b").find_iter(rhs).any(|m| m.as_str() == word)
    };
    let fresh = |rhs: &str| {
        let rhs = rhs.trim().trim_end_matches(';').trim();
        !derived_from(rhs, name)
            && (rhs.parse::<i64>().is_ok() || loop_vars.iter().any(|v| derived_from(rhs, v)))
    };

    if let Some(c) = re!(
        r"^\s*(?:(?:int|long|let|var|auto|const|size_t|usize|mut)\s+)*(\w+)\s*(?::\s*\w+\s*)?=\s*([^=].*)$"
    )
    .captures(text)
    {
        if &c[1] == name {
            let rhs = c[2].split(',').next().unwrap_or("");
            return fresh(rhs);
        }
    }
    if let Some(c) = re!(r"^\s*(\w+)\s*,\s*(\w+)\s*=\s*([^=,]+),\s*([^=]+)$").captures(text) {
        if &c[1] == name {
            return fresh(&c[3]);
        }
        if &c[2] == name {
            return fresh(&c[4]);
        }
    }
    false
}

/// Some pointer in `names` is reset inside a loop body from an enclosing
/// loop variable or a literal.
pub fn pointer_resets(src: &Source, loops: &[LoopInfo], names: &[&str]) -> bool {
    for lp in loops {
        for i in lp.body() {
            let vars: Vec<&str> = loops
                .iter()
                .filter(|l| l.contains_line(i))
                .filter_map(|l| l.var.as_deref())
                .collect();
            let text = src.line(i);
            if names.iter().any(|n| assigns_fresh(text, n, &vars)) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::loops::scan;
    use crate::language::Language;

    #[test]
    fn test_motion_names() {
        assert_eq!(advanced_names("left += 1"), vec!["left"]);
        assert_eq!(advanced_names("i++; ++j;"), vec!["i", "j"]);
        assert_eq!(advanced_names("lo = mid + 1"), Vec::<String>::new());
        assert_eq!(retreated_names("right -= 1"), vec!["right"]);
        assert_eq!(retreated_names("hi = hi - 1"), vec!["hi"]);
    }

    #[test]
    fn test_midpoint() {
        assert!(is_midpoint("mid = (lo + hi) // 2"));
        assert!(is_midpoint("int mid = left + (right - left) / 2;"));
        assert!(is_midpoint("m := (l + r) >> 1"));
        assert!(!is_midpoint("half = n // 2"));
    }

    #[test]
    fn test_midpoint_name() {
        assert_eq!(midpoint_name("center = (lo + hi) // 2").as_deref(), Some("center"));
        assert_eq!(midpoint_name("const m = Math.floor((lo + hi) / 2);").as_deref(), Some("m"));
        assert_eq!(midpoint_name("let split = n >> 1;").as_deref(), Some("split"));
        assert_eq!(midpoint_name("if a == b / 2:"), None);
        assert_eq!(midpoint_name("total += x"), None);
    }

    #[test]
    fn test_window_shrink_is_amortized() {
        let code = "\
def min_len(nums, target):
    left = 0
    total = 0
    best = 0
    for right in range(len(nums)):
        total += nums[right]
        while total >= target:
            total -= nums[left]
            left += 1
    return best
";
        let s = scan(&Source::new(code, Language::Python));
        assert_eq!(s.loops[1].amortized, Some(Amortization::WindowShrink));
        assert_eq!(s.max_credited_depth(), 1);
    }

    #[test]
    fn test_reset_pointer_is_not_amortized() {
        let code = "\
def count(nums):
    for i in range(len(nums)):
        j = i
        while j < len(nums):
            j += 1
";
        let s = scan(&Source::new(code, Language::Python));
        assert_eq!(s.loops[1].amortized, None);
        assert_eq!(s.max_credited_depth(), 2);
    }

    #[test]
    fn test_converging_pointers() {
        let code = "\
def is_pal(s):
    left, right = 0, len(s) - 1
    while left < right:
        if s[left] != s[right]:
            return False
        left += 1
        right -= 1
    return True
";
        let src = Source::new(code, Language::Python);
        let s = scan(&src);
        assert!(is_converging(&src, &s.loops[0]));
    }

    #[test]
    fn test_pointer_reset_from_outer_variable() {
        let code = "\
for i in range(n):
    left, right = i + 1, n - 1
    while left < right:
        left += 1
";
        let src = Source::new(code, Language::Python);
        let s = scan(&src);
        assert!(pointer_resets(&src, &s.loops, &["left", "right"]));

        let code = "\
for right in range(n):
    left = max(left, seen[right] + 1)
";
        let src = Source::new(code, Language::Python);
        let s = scan(&src);
        assert!(!pointer_resets(&src, &s.loops, &["left"]));
    }
}

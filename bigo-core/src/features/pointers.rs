//! Pointer motion: left/right, start/end, slow/fast and sliding windows

use super::loops::LoopScan;
use super::PointerFeatures;
use crate::shapes::{self, Amortization};
use crate::source::{re, Source};
use std::collections::BTreeSet;

/// Pointer names whose backwards reset disqualifies linear motion
const POINTER_NAMES: &[&str] = &[
    "left", "right", "l", "r", "start", "end", "lo", "hi", "slow", "fast", "i", "j",
];

pub fn detect(src: &Source, scan: &LoopScan) -> PointerFeatures {
    let mut advanced = BTreeSet::new();
    let mut retreated = BTreeSet::new();
    for line in src.lines() {
        advanced.extend(shapes::advanced_names(&line.text));
        retreated.extend(shapes::retreated_names(&line.text));
    }
    let moves_up = |name: &str| advanced.contains(name);
    let moves_down = |name: &str| retreated.contains(name);

    // Binary search also has `left`/`right`, but jumps them to a midpoint
    let binary_search_shaped = src.is_match(re!(r"\[\s*mid\s*\]"))
        || src.lines().iter().any(|l| shapes::is_midpoint(&l.text));

    let converging = scan
        .loops
        .iter()
        .any(|lp| lp.parent.is_none() && shapes::is_converging(src, lp));

    let left_right = !binary_search_shaped
        && ((moves_up("left") && moves_down("right"))
            || (moves_up("l") && moves_down("r"))
            || converging);

    let start_end = !binary_search_shaped
        && moves_up("start")
        && (moves_down("end") || moves_up("end"));

    let slow_fast = src.mentions(&["slow"])
        && src.mentions(&["fast"])
        && src.is_match(re!(
            r"\bfast\s*=\s*fast\.next\.next|\bfast\.next\.next|\bfast\s*\+=\s*2|\bfast\s*=\s*\w+\[\s*\w+\[\s*fast\s*\]\s*\]|\bfast\s*=\s*fast\.next\b"
        ));

    let shrinking_window = scan
        .loops
        .iter()
        .any(|lp| lp.amortized == Some(Amortization::WindowShrink));
    let fixed_window = scan.max_depth() >= 1
        && src.is_match(re!(r"\w+\s*\[\s*\w+\s*-\s*k\s*\]|(?i)\bwindow\w*\s*(?:\+=|-=)"));
    let sliding_window = !binary_search_shaped && (shrinking_window || fixed_window);

    let names: Vec<&str> = POINTER_NAMES
        .iter()
        .copied()
        .filter(|n| src.mentions(&[*n]))
        .collect();
    let forward_only = !shapes::pointer_resets(src, &scan.loops, &names);

    PointerFeatures {
        two_pointers: left_right || start_end || slow_fast || sliding_window,
        sliding_window,
        left_right,
        slow_fast,
        forward_only,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::loops::scan;
    use crate::language::Language;

    fn pointers_of(code: &str, language: Language) -> PointerFeatures {
        let src = Source::new(code, language);
        let s = scan(&src);
        detect(&src, &s)
    }

    #[test]
    fn test_converging_left_right() {
        let code = "\
def max_area(height):
    left, right = 0, len(height) - 1
    best = 0
    while left < right:
        best = max(best, min(height[left], height[right]) * (right - left))
        if height[left] < height[right]:
            left += 1
        else:
            right -= 1
    return best
";
        let p = pointers_of(code, Language::Python);
        assert!(p.left_right);
        assert!(p.two_pointers);
        assert!(p.forward_only);
        assert!(!p.sliding_window);
    }

    #[test]
    fn test_binary_search_is_not_two_pointers() {
        let code = "\
int search(int[] a, int t) {
    int left = 0, right = a.length - 1;
    while (left <= right) {
        int mid = left + (right - left) / 2;
        if (a[mid] == t) return mid;
        if (a[mid] < t) left = mid + 1; else right = mid - 1;
    }
    return -1;
}
";
        let p = pointers_of(code, Language::Java);
        assert!(!p.left_right);
        assert!(!p.sliding_window);
    }

    #[test]
    fn test_slow_fast() {
        let code = "\
def has_cycle(head):
    slow = fast = head
    while fast and fast.next:
        slow = slow.next
        fast = fast.next.next
        if slow is fast:
            return True
    return False
";
        let p = pointers_of(code, Language::Python);
        assert!(p.slow_fast);
        assert!(p.two_pointers);
    }

    #[test]
    fn test_shrinking_window() {
        let code = "\
def longest(s):
    seen = set()
    left = 0
    best = 0
    for right in range(len(s)):
        while s[right] in seen:
            seen.remove(s[left])
            left += 1
        seen.add(s[right])
        best = max(best, right - left + 1)
    return best
";
        let p = pointers_of(code, Language::Python);
        assert!(p.sliding_window);
        assert!(p.forward_only);
    }

    #[test]
    fn test_reset_pointers_are_not_forward_only() {
        let code = "\
def three_sum(nums):
    nums.sort()
    for i in range(len(nums)):
        left, right = i + 1, len(nums) - 1
        while left < right:
            left += 1
            right -= 1
";
        let p = pointers_of(code, Language::Python);
        assert!(p.left_right);
        assert!(!p.forward_only);
    }
}

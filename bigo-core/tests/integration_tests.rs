//! Integration tests for complexity analysis over fixture snippets

use bigo_core::consensus::ClaimedComplexity;
use bigo_core::result::Approach;
use bigo_core::{ApproachTriple, ComplexityClass, Engine, EngineSettings, Language};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

fn analyze(name: &str) -> bigo_core::ComplexityResult {
    let path = fixture_path(name);
    let language = Language::from_path(&path).unwrap();
    Engine::new().analyze(&fixture(name), language, None)
}

#[test]
fn test_single_loop() {
    let r = analyze("single_loop.py");
    assert_eq!(r.time_complexity, ComplexityClass::Linear);
    assert_eq!(r.space_complexity, ComplexityClass::Constant);
    assert_eq!(r.source, "rule_engine");
    assert!(r.corrections_applied.is_empty());
}

#[test]
fn test_nested_loops_are_quadratic() {
    let r = analyze("nested_loops.py");
    assert_eq!(r.time_complexity, ComplexityClass::Quadratic);
    assert_eq!(r.space_complexity, ComplexityClass::Constant);
}

#[test]
fn test_merge_sort_hazard() {
    let r = analyze("merge_sort.py");
    assert_eq!(r.source, "hazard:merge_sort");
    assert_eq!(r.time_complexity, ComplexityClass::NLogN);
    assert_eq!(r.space_complexity, ComplexityClass::Linear);
    assert_eq!(r.pattern.as_deref(), Some("merge_sort"));
}

#[test]
fn test_merge_sort_without_hazard_uses_recurrence() {
    let engine = Engine::new().with_settings(EngineSettings {
        disabled_hazards: vec!["merge_sort".to_string()],
        ..EngineSettings::default()
    });
    let r = engine.analyze(&fixture("merge_sort.py"), Language::Python, None);
    assert_eq!(r.source, "rule_engine");
    assert_eq!(r.time_complexity, ComplexityClass::NLogN);
}

#[test]
fn test_split_on_renamed_midpoint_is_n_log_n() {
    let r = analyze("split_at_center.py");
    assert_eq!(r.time_complexity, ComplexityClass::NLogN);
    assert_eq!(r.space_complexity, ComplexityClass::Linear);
}

#[test]
fn test_monotonic_stack_is_linear() {
    let r = analyze("next_greater.js");
    assert_eq!(r.time_complexity, ComplexityClass::Linear);
}

#[test]
fn test_hazard_overrides_nested_loops() {
    // Two nested loops, but the sieve recognizer decides
    let r = analyze("sieve.py");
    assert_eq!(r.source, "hazard:sieve_of_eratosthenes");
    assert_eq!(r.time_complexity, ComplexityClass::NLogLogN);
    assert_eq!(r.space_complexity, ComplexityClass::Linear);
}

#[test]
fn test_two_sum_title_lookup() {
    let r = Engine::new().analyze(&fixture("two_sum_hash.py"), Language::Python, Some("Two Sum"));
    assert_eq!(r.source, "ground_truth");
    assert_eq!(r.confidence, 1.0);
    assert_eq!(r.time_complexity, ComplexityClass::Linear);
    assert_eq!(r.space_complexity, ComplexityClass::Linear);
    assert_eq!(r.pattern.as_deref(), Some("two-sum"));
}

#[test]
fn test_two_sum_fingerprint_lookup() {
    let r = analyze("two_sum_hash.py");
    assert_eq!(r.source, "ground_truth");
    assert!(r.confidence < 1.0);
    assert_eq!(r.time_complexity, ComplexityClass::Linear);
    assert_eq!(r.space_complexity, ComplexityClass::Linear);
}

#[test]
fn test_generic_nested_loops_stay_quadratic() {
    let code = "\
def count(nums, target):
    c = 0
    for i in range(len(nums)):
        for j in range(len(nums)):
            mid = (nums[i] + nums[j]) // 2
            if mid == target:
                c += 1
    return c
";
    let r = Engine::new().analyze(code, Language::Python, None);
    assert_ne!(r.source, "ground_truth");
    assert_eq!(r.time_complexity, ComplexityClass::Quadratic);
    assert_eq!(r.space_complexity, ComplexityClass::Constant);
}

#[test]
fn test_two_sum_brute_force_matches_brute_approach() {
    let r = Engine::new().analyze(&fixture("two_sum_brute.py"), Language::Python, Some("1. Two Sum"));
    assert_eq!(r.source, "ground_truth");
    assert_eq!(r.time_complexity, ComplexityClass::Quadratic);
    assert_eq!(r.space_complexity, ComplexityClass::Constant);
}

#[test]
fn test_claim_against_fixture() {
    let engine = Engine::new();
    let code = fixture("nested_loops.py");

    let agreed = engine.validate_against_claim(&code, Language::Python, "O(n^2)", "O(1)");
    assert!(agreed.valid);

    let understated = engine.validate_against_claim(&code, Language::Python, "O(n)", "O(1)");
    assert!(!understated.valid);
    assert_eq!(understated.corrected_result.time_complexity, ComplexityClass::Quadratic);
    let correction = &understated.corrected_result.corrections_applied[0];
    assert_eq!(correction.old_value, "O(n)");
    assert_eq!(correction.new_value, "O(n²)");
}

#[test]
fn test_two_sum_triple_drops_better() {
    let code = ApproachTriple {
        brute_force: Some(fixture("two_sum_brute.py")),
        better: None,
        optimal: Some(fixture("two_sum_hash.py")),
    };
    let claims = ApproachTriple {
        brute_force: Some(ClaimedComplexity::new("O(n^2)", "O(1)")),
        better: Some(ClaimedComplexity::new("O(n log n)", "O(1)")),
        optimal: Some(ClaimedComplexity::new("O(n)", "O(n)")),
    };
    let r = Engine::new().validate_triple(Some("Two Sum"), Language::Python, &code, &claims);

    assert_eq!(r.source, "ground_truth");
    assert!(r.solution.better.is_none());
    assert!(r.corrections.iter().any(|c| c.approach == Approach::Better));
    let brute = r.solution.brute_force.as_ref().unwrap();
    let optimal = r.solution.optimal.as_ref().unwrap();
    assert_eq!(brute.time_complexity, ComplexityClass::Quadratic);
    assert_eq!(optimal.time_complexity, ComplexityClass::Linear);
    assert_eq!(optimal.space_complexity, ComplexityClass::Linear);
}

#[test]
fn test_triple_identical_better_is_dropped() {
    let code = ApproachTriple {
        brute_force: Some(fixture("nested_loops.py")),
        better: Some(fixture("running_sum.py")),
        optimal: Some(fixture("running_diff.py")),
    };
    let r = Engine::new().validate_triple(None, Language::Python, &code, &ApproachTriple::default());

    assert!(!r.valid);
    assert!(r.solution.better.is_none());
    let dropped = r.corrections.iter().find(|c| c.approach == Approach::Better).unwrap();
    assert!(!dropped.reason.is_empty());
    assert_eq!(r.solution.optimal.as_ref().unwrap().time_complexity, ComplexityClass::Linear);
}

#[test]
fn test_untagged_snippet_language_is_inferred() {
    let code = fixture("nested_loops.py");
    assert_eq!(Language::from_tag("cobol"), Language::Unknown);
    let r = Engine::new().analyze(&code, Language::infer(&code), None);
    assert_eq!(r.time_complexity, ComplexityClass::Quadratic);
}

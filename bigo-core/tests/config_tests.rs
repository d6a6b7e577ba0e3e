//! Configuration loading and its effect on the engine

use bigo_core::config::load_and_resolve;
use bigo_core::{collect_source_files, ComplexityClass, Engine, Language};
use std::fs;
use tempfile::TempDir;

const EXTRA_DATASET: &str = r#"{
  "entries": [
    {
      "id": "count-pairs",
      "titles": ["Count Equal Pairs"],
      "fingerprint": ["countpairs", "pairs", "equal"],
      "brute_force": {"time": "O(n^2)", "space": "O(1)", "algorithm": "compare every pair"},
      "optimal": {"time": "O(n)", "space": "O(n)", "algorithm": "count occurrences in a hash map"},
      "has_optimization_ladder": false
    }
  ]
}"#;

#[test]
fn test_discovered_config_drives_engine() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("extra.json"), EXTRA_DATASET).unwrap();
    fs::write(
        dir.path().join(".bigorc.json"),
        r#"{
            "ground_truth": "extra.json",
            "disabled_hazards": ["gcd_recursive"],
            "claim_confidence": 0.4
        }"#,
    )
    .unwrap();

    let resolved = load_and_resolve(dir.path(), None).unwrap();
    assert_eq!(resolved.config_path.as_deref(), Some(dir.path().join(".bigorc.json").as_path()));
    assert_eq!(resolved.ground_truth.as_deref(), Some(dir.path().join("extra.json").as_path()));

    let engine = Engine::from_config(&resolved).unwrap();
    assert_eq!(engine.ground_truth().len(), Engine::new().ground_truth().len() + 1);
    assert_eq!(engine.settings().claim_confidence, 0.4);

    let code = "def count(nums):\n    c = 0\n    for i in range(len(nums)):\n        for j in range(i + 1, len(nums)):\n            c += nums[i] == nums[j]\n    return c\n";
    let r = engine.analyze(code, Language::Python, Some("Count Equal Pairs"));
    assert_eq!(r.source, "ground_truth");
    assert_eq!(r.pattern.as_deref(), Some("count-pairs"));
    assert_eq!(r.time_complexity, ComplexityClass::Quadratic);

    let gcd = "def gcd(a, b):\n    return a if b == 0 else gcd(b, a % b)\n";
    assert!(!engine.analyze(gcd, Language::Python, None).source.starts_with("hazard:"));
}

#[test]
fn test_duplicate_dataset_id_is_rejected() {
    let dir = TempDir::new().unwrap();
    let duplicate = EXTRA_DATASET.replace("count-pairs", "two-sum");
    fs::write(dir.path().join("extra.json"), duplicate).unwrap();
    fs::write(dir.path().join("bigo.config.json"), r#"{"ground_truth": "extra.json"}"#).unwrap();

    let resolved = load_and_resolve(dir.path(), None).unwrap();
    let err = Engine::from_config(&resolved).unwrap_err();
    assert!(format!("{:#}", err).contains("two-sum"));
}

#[test]
fn test_missing_dataset_is_an_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".bigorc.json"), r#"{"ground_truth": "nope.json"}"#).unwrap();
    let resolved = load_and_resolve(dir.path(), None).unwrap();
    assert!(Engine::from_config(&resolved).is_err());
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".bigorc.json"), r#"{"fingerprint_threshold": 0}"#).unwrap();
    assert!(load_and_resolve(dir.path(), None).is_err());

    fs::write(dir.path().join(".bigorc.json"), r#"{"disabled_hazards": ["no_such_recognizer"]}"#).unwrap();
    assert!(load_and_resolve(dir.path(), None).is_err());

    fs::write(dir.path().join(".bigorc.json"), r#"{"weights": {}}"#).unwrap();
    assert!(load_and_resolve(dir.path(), None).is_err());
}

#[test]
fn test_exclude_patterns_filter_directory_mode() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::create_dir_all(dir.path().join("vendor/lib")).unwrap();
    fs::write(dir.path().join("src/a.py"), "for x in xs:\n    pass\n").unwrap();
    fs::write(dir.path().join("vendor/lib/b.py"), "for x in xs:\n    pass\n").unwrap();

    let resolved = load_and_resolve(dir.path(), None).unwrap();
    let files = collect_source_files(dir.path(), Some(&resolved)).unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("src/a.py"));
}

//! Configuration file support for bigo
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.bigorc.json` in project root
//! 3. `bigo.config.json` in project root
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::ground_truth::DEFAULT_FINGERPRINT_THRESHOLD;
use crate::hazards;
use crate::language::Language;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default exclude patterns applied when no config is specified
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/target/**",
    "**/vendor/**",
    "**/dist/**",
    "**/build/**",
    "**/.git/**",
    "**/__pycache__/**",
];

pub const DEFAULT_CLAIM_CONFIDENCE: f64 = 0.5;

/// bigo configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BigoConfig {
    /// Glob patterns for files to include in directory mode (default: all supported extensions)
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns for files to exclude (default: build and vendor directories)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Minimum fingerprint overlap for a ground truth match (default: 0.5)
    #[serde(default)]
    pub fingerprint_threshold: Option<f64>,

    /// Confidence given to externally claimed complexities (default: 0.5)
    #[serde(default)]
    pub claim_confidence: Option<f64>,

    /// Hazard recognizers to skip
    #[serde(default)]
    pub disabled_hazards: Vec<String>,

    /// Extra ground truth dataset appended to the built-in one
    #[serde(default)]
    pub ground_truth: Option<PathBuf>,

    /// Language tag used when it cannot be inferred from a file extension
    #[serde(default)]
    pub language: Option<String>,
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Compiled include patterns (empty means include all)
    pub include: Option<GlobSet>,
    /// Compiled exclude patterns
    pub exclude: GlobSet,
    pub fingerprint_threshold: f64,
    pub claim_confidence: f64,
    pub disabled_hazards: Vec<String>,
    /// Extra dataset, relative paths resolved against the config file's directory
    pub ground_truth: Option<PathBuf>,
    pub language: Option<Language>,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl BigoConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.fingerprint_threshold {
            if !(t > 0.0 && t <= 1.0) {
                anyhow::bail!("fingerprint_threshold must be in (0, 1] (got {})", t);
            }
        }

        if let Some(c) = self.claim_confidence {
            if !(0.0..=1.0).contains(&c) {
                anyhow::bail!("claim_confidence must be in [0, 1] (got {})", c);
            }
        }

        for name in &self.disabled_hazards {
            if !hazards::is_known(name) {
                anyhow::bail!("disabled_hazards: unknown hazard {:?}", name);
            }
        }

        if let Some(ref tag) = self.language {
            if Language::from_tag(tag) == Language::Unknown {
                anyhow::bail!("language: unrecognized language tag {:?}", tag);
            }
        }

        // Validate glob patterns compile
        for pattern in &self.include {
            Glob::new(pattern).with_context(|| format!("invalid include pattern: {}", pattern))?;
        }
        for pattern in &self.exclude {
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let include = if self.include.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.include {
                builder.add(Glob::new(pattern)?);
            }
            Some(builder.build()?)
        };

        // User excludes replace the defaults
        let exclude = {
            let mut builder = GlobSetBuilder::new();
            if self.exclude.is_empty() {
                for pattern in DEFAULT_EXCLUDES {
                    builder.add(Glob::new(pattern)?);
                }
            } else {
                for pattern in &self.exclude {
                    builder.add(Glob::new(pattern)?);
                }
            }
            builder.build()?
        };

        Ok(ResolvedConfig {
            include,
            exclude,
            fingerprint_threshold: self.fingerprint_threshold.unwrap_or(DEFAULT_FINGERPRINT_THRESHOLD),
            claim_confidence: self.claim_confidence.unwrap_or(DEFAULT_CLAIM_CONFIDENCE),
            disabled_hazards: self.disabled_hazards.clone(),
            ground_truth: self.ground_truth.clone(),
            language: self.language.as_deref().map(Language::from_tag),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Check if a file path should be included based on include/exclude patterns
    pub fn should_include(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        if self.exclude.is_match(path_str.as_ref()) {
            return false;
        }

        if let Some(ref include) = self.include {
            return include.is_match(path_str.as_ref());
        }

        true
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        BigoConfig::default().resolve()
    }
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.bigorc.json`
/// 2. `bigo.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(BigoConfig, PathBuf)>> {
    for name in [".bigorc.json", "bigo.config.json"] {
        let path = project_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<BigoConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: BigoConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (BigoConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    if let (Some(dataset), Some(cfg)) = (&resolved.ground_truth, &source_path) {
        if dataset.is_relative() {
            let base = cfg.parent().unwrap_or_else(|| Path::new("."));
            resolved.ground_truth = Some(base.join(dataset));
        }
    }
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = BigoConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert!(resolved.include.is_none());
        assert_eq!(resolved.fingerprint_threshold, 0.5);
        assert_eq!(resolved.claim_confidence, 0.5);
        assert!(resolved.disabled_hazards.is_empty());
        assert!(resolved.ground_truth.is_none());
        assert!(resolved.language.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "include": ["src/**/*.py"],
            "exclude": ["**/generated/**"],
            "fingerprint_threshold": 0.75,
            "claim_confidence": 0.3,
            "disabled_hazards": ["three_sum", "kadane"],
            "ground_truth": "extra.json",
            "language": "python"
        }"#;
        let config: BigoConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        let resolved = config.resolve().unwrap();
        assert!(resolved.include.is_some());
        assert_eq!(resolved.fingerprint_threshold, 0.75);
        assert_eq!(resolved.claim_confidence, 0.3);
        assert_eq!(resolved.disabled_hazards, vec!["three_sum", "kadane"]);
        assert_eq!(resolved.language, Some(Language::Python));
    }

    #[test]
    fn test_reject_unknown_fields() {
        let json = r#"{"unknown_field": true}"#;
        let result: Result<BigoConfig, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unknown fields should be rejected");
    }

    #[test]
    fn test_reject_out_of_range_values() {
        for json in [
            r#"{"fingerprint_threshold": 0.0}"#,
            r#"{"fingerprint_threshold": 1.5}"#,
            r#"{"claim_confidence": -0.1}"#,
            r#"{"claim_confidence": 2.0}"#,
        ] {
            let config: BigoConfig = serde_json::from_str(json).unwrap();
            assert!(config.validate().is_err(), "{json} should be rejected");
        }
    }

    #[test]
    fn test_reject_unknown_hazard_and_language() {
        let config: BigoConfig = serde_json::from_str(r#"{"disabled_hazards": ["bogo_sort"]}"#).unwrap();
        assert!(config.validate().is_err());
        let config: BigoConfig = serde_json::from_str(r#"{"language": "cobol"}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_invalid_glob_pattern() {
        let json = r#"{"include": ["[invalid"]}"#;
        let config: BigoConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_should_include_default_excludes() {
        let resolved = ResolvedConfig::defaults().unwrap();
        assert!(!resolved.should_include(Path::new("node_modules/pkg/index.js")));
        assert!(!resolved.should_include(Path::new("crate/target/debug/build.rs")));
        assert!(resolved.should_include(Path::new("solutions/two_sum.py")));
    }

    #[test]
    fn test_should_include_custom_patterns() {
        let config: BigoConfig = serde_json::from_str(
            r#"{
            "include": ["src/**/*.py"],
            "exclude": ["src/generated/**"]
        }"#,
        )
        .unwrap();
        let resolved = config.resolve().unwrap();
        assert!(resolved.should_include(Path::new("src/solve.py")));
        assert!(!resolved.should_include(Path::new("lib/util.py")));
        assert!(!resolved.should_include(Path::new("src/generated/table.py")));
    }

    #[test]
    fn test_discover_bigorc() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".bigorc.json");
        fs::write(&config_path, r#"{"claim_confidence": 0.2}"#).unwrap();

        let (config, path) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.claim_confidence, Some(0.2));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".bigorc.json"), r#"{"fingerprint_threshold": 0.6}"#).unwrap();
        fs::write(dir.path().join("bigo.config.json"), r#"{"fingerprint_threshold": 0.9}"#).unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.fingerprint_threshold, Some(0.6), ".bigorc.json should take priority");

        fs::remove_file(dir.path().join(".bigorc.json")).unwrap();
        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.fingerprint_threshold, Some(0.9));
    }

    #[test]
    fn test_no_config_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
    }

    #[test]
    fn test_load_and_resolve_relative_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, r#"{"ground_truth": "data/extra.json"}"#).unwrap();

        let resolved = load_and_resolve(Path::new("."), Some(&config_path)).unwrap();
        assert_eq!(resolved.ground_truth, Some(dir.path().join("data/extra.json")));
        assert_eq!(resolved.config_path, Some(config_path));
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".bigorc.json");
        fs::write(&config_path, r#"{"claim_confidence": 7}"#).unwrap();
        let err = discover_config(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains(".bigorc.json"));
    }
}

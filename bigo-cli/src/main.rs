//! bigo CLI - deterministic Big-O complexity analysis of algorithm snippets

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output
// - Diagnostics go to stderr; stdout carries only the report

use anyhow::Context;
use bigo_core::config::{self, ResolvedConfig};
use bigo_core::report::{render_claim_text, render_consensus_text, to_json};
use bigo_core::{
    collect_source_files, render_json, render_text, sort_reports, ApproachTriple, ClaimedComplexity, Engine,
    FileReport, Language,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bigo")]
#[command(about = "Deterministic Big-O time and space analysis for algorithm snippets")]
#[command(version = env!("BIGO_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a snippet file, or every supported file under a directory
    Analyze {
        /// Path to source file or directory
        path: PathBuf,

        /// Language tag (default: file extension, then config, then inferred)
        #[arg(long)]
        lang: Option<String>,

        /// Problem title used for ground truth lookup
        #[arg(long)]
        title: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check a claimed time/space complexity against the analysis of a file
    Check {
        /// Path to source file
        file: PathBuf,

        /// Claimed time complexity, e.g. "O(n log n)"
        #[arg(long)]
        time: String,

        /// Claimed space complexity, e.g. "O(1)"
        #[arg(long)]
        space: String,

        #[arg(long)]
        lang: Option<String>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Reconcile brute force, better and optimal solutions of one problem
    Triple {
        /// Problem title used for ground truth lookup
        #[arg(long)]
        title: Option<String>,

        /// Brute force solution file
        #[arg(long)]
        brute: Option<PathBuf>,

        /// Intermediate solution file
        #[arg(long)]
        better: Option<PathBuf>,

        /// Optimal solution file
        #[arg(long)]
        optimal: Option<PathBuf>,

        /// JSON file of claimed complexities:
        /// {"brute_force": {"time": "...", "space": "..."}, "better": ..., "optimal": ...}
        #[arg(long)]
        claims: Option<PathBuf>,

        #[arg(long)]
        lang: Option<String>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate or display configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without running analysis
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            lang,
            title,
            format,
            config: config_path,
        } => {
            let path = absolutize(path)?;
            if !path.exists() {
                anyhow::bail!("Path does not exist: {}", path.display());
            }

            let resolved = load_config(&path, config_path.as_deref())?;
            let engine = Engine::from_config(&resolved).context("failed to build analysis engine")?;

            // An explicitly named file is analyzed whatever its extension
            let files = if path.is_file() {
                vec![path.clone()]
            } else {
                collect_source_files(&path, Some(&resolved))?
            };
            tracing::debug!(files = files.len(), "collected source files");

            let progress = progress_bar(files.len());
            let reports: Vec<FileReport> = files
                .par_iter()
                .filter_map(|file| {
                    let report = analyze_file(&engine, &resolved, &path, file, lang.as_deref(), title.as_deref());
                    progress.inc(1);
                    report
                })
                .collect();
            progress.finish_and_clear();

            let reports = sort_reports(reports);
            match format {
                OutputFormat::Text => print!("{}", render_text(&reports)),
                OutputFormat::Json => println!("{}", render_json(&reports)),
            }
        }
        Commands::Check {
            file,
            time,
            space,
            lang,
            format,
            config: config_path,
        } => {
            let file = absolutize(file)?;
            let code = read_snippet(&file)?;
            let resolved = load_config(&file, config_path.as_deref())?;
            let engine = Engine::from_config(&resolved).context("failed to build analysis engine")?;
            let language = resolve_language(lang.as_deref(), Some(&file), &resolved, &code);

            let check = engine.validate_against_claim(&code, language, &time, &space);
            match format {
                OutputFormat::Text => print!("{}", render_claim_text(&check)),
                OutputFormat::Json => println!("{}", to_json(&check)),
            }
            if !check.valid {
                std::process::exit(1);
            }
        }
        Commands::Triple {
            title,
            brute,
            better,
            optimal,
            claims,
            lang,
            format,
            config: config_path,
        } => {
            let paths = ApproachTriple {
                brute_force: brute.map(absolutize).transpose()?,
                better: better.map(absolutize).transpose()?,
                optimal: optimal.map(absolutize).transpose()?,
            };
            if paths.is_empty() && claims.is_none() {
                anyhow::bail!("triple needs at least one of --brute, --better, --optimal or --claims");
            }

            let anchor = match paths.iter().next() {
                Some((_, p)) => p.clone(),
                None => std::env::current_dir()?,
            };
            let resolved = load_config(&anchor, config_path.as_deref())?;
            let engine = Engine::from_config(&resolved).context("failed to build analysis engine")?;

            let code = ApproachTriple {
                brute_force: paths.brute_force.as_deref().map(read_snippet).transpose()?,
                better: paths.better.as_deref().map(read_snippet).transpose()?,
                optimal: paths.optimal.as_deref().map(read_snippet).transpose()?,
            };
            let claimed = match claims {
                Some(p) => load_claims(&p)?,
                None => ApproachTriple::default(),
            };

            let first_code = code.iter().next().map(|(_, c)| c.as_str()).unwrap_or("");
            let first_path = paths.iter().next().map(|(_, p)| p.as_path());
            let language = resolve_language(lang.as_deref(), first_path, &resolved, first_code);

            let result = engine.validate_triple(title.as_deref(), language, &code, &claimed);
            match format {
                OutputFormat::Text => print!("{}", render_consensus_text(&result)),
                OutputFormat::Json => println!("{}", to_json(&result)),
            }
            if !result.valid {
                std::process::exit(1);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .and_then(|config| Engine::from_config(&config).map(|_| config));

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;
                print_config(&resolved);
            }
        },
    }

    Ok(())
}

/// Analyze one file, logging and skipping it when it cannot be read
fn analyze_file(
    engine: &Engine,
    config: &ResolvedConfig,
    root: &Path,
    file: &Path,
    lang: Option<&str>,
    title: Option<&str>,
) -> Option<FileReport> {
    let code = match read_snippet(file) {
        Ok(code) => code,
        Err(e) => {
            tracing::warn!("skipping {}: {:#}", file.display(), e);
            return None;
        }
    };
    let language = resolve_language(lang, Some(file), config, &code);
    let result = engine.analyze(&code, language, title);

    let display = if root.is_dir() {
        file.strip_prefix(root).unwrap_or(file)
    } else {
        file
    };
    Some(FileReport {
        file: display.to_string_lossy().replace('\\', "/"),
        language: language.name().to_string(),
        result,
    })
}

/// Language precedence: explicit tag, file extension, config default, inference
fn resolve_language(tag: Option<&str>, path: Option<&Path>, config: &ResolvedConfig, code: &str) -> Language {
    if let Some(tag) = tag {
        return Language::from_tag(tag);
    }
    path.and_then(Language::from_path)
        .or(config.language)
        .unwrap_or_else(|| Language::infer(code))
}

fn read_snippet(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_claims(path: &Path) -> anyhow::Result<ApproachTriple<ClaimedComplexity>> {
    let text = read_snippet(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid claims file: {}", path.display()))
}

fn load_config(anchor: &Path, explicit: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let project_root = find_project_root(anchor);
    let resolved = config::load_and_resolve(&project_root, explicit).context("failed to load configuration")?;
    if let Some(ref p) = resolved.config_path {
        eprintln!("Using config: {}", p.display());
    }
    Ok(resolved)
}

fn absolutize(path: PathBuf) -> anyhow::Result<PathBuf> {
    if path.is_relative() {
        Ok(std::env::current_dir()?.join(path))
    } else {
        Ok(path)
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    if len < 2 || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message("analyzing");
    bar
}

fn print_config(resolved: &ResolvedConfig) {
    println!("Configuration:");
    if let Some(ref p) = resolved.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!();
    println!("Analysis:");
    println!("  fingerprint_threshold: {}", resolved.fingerprint_threshold);
    println!("  claim_confidence: {}", resolved.claim_confidence);
    println!(
        "  language: {}",
        resolved.language.map(|l| l.name()).unwrap_or("inferred")
    );
    println!(
        "  disabled_hazards: {}",
        if resolved.disabled_hazards.is_empty() {
            "none".to_string()
        } else {
            resolved.disabled_hazards.join(", ")
        }
    );
    println!(
        "  ground_truth: {}",
        resolved
            .ground_truth
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in only".to_string())
    );
    println!();
    println!("Filters:");
    println!(
        "  include: {}",
        if resolved.include.is_some() {
            "custom patterns"
        } else {
            "all supported files"
        }
    );
    println!("  exclude: {} patterns", resolved.exclude.len());
}

/// Directory holding the nearest `.git` above `start_path`, else the start directory
fn find_project_root(start_path: &Path) -> PathBuf {
    let start = if start_path.is_file() {
        start_path.parent().unwrap_or(start_path).to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    let mut current = start.as_path();
    loop {
        if current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return start,
        }
    }
}

use std::env;
use std::path::PathBuf;

use syllabus_cli::{init_tracing, load_config, load_embedder};
use syllabus_engine::{ScopeDecision, ScopeEngine};
use syllabus_relevance::evaluation::load_dataset;

fn print_decision(d: &ScopeDecision) {
    let c = &d.classification;
    println!("Question: {}", c.question);
    match &c.excluded_by {
        Some(keyword) => println!("  tier={}  excluded by '{keyword}'", c.tier),
        None => {
            let unit = c.best_unit.map_or_else(|| "-".to_string(), |u| u.to_string());
            println!("  tier={}  best={unit} ({:.3})  confidence={}  gap={:.3}", c.tier, c.best_score, c.confidence, c.score_gap());
            let scores: Vec<String> = c.unit_scores.iter().map(|(u, s)| format!("{u}: {s:.3}")).collect();
            println!("  scores: {}", scores.join(", "));
        }
    }
    if c.ambiguous {
        println!("  ⚠️  ambiguous: {:?}", c.ambiguity);
    }
    let corr = &d.correction;
    if let Some(final_unit) = corr.final_unit {
        let related: Vec<String> = corr.related_units.iter().map(ToString::to_string).collect();
        println!("  final={final_unit}  related=[{}]", related.join(", "));
    }
    if let Some(reason) = &corr.reason {
        println!("  correction: {reason}");
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().skip(1).collect();
    let mut questions = Vec::new();
    let mut dataset: Option<PathBuf> = None;
    let mut json = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--eval" | "-e" => match args.get(i + 1) {
                Some(path) => {
                    dataset = Some(PathBuf::from(path));
                    i += 1;
                }
                None => {
                    eprintln!("Error: --eval requires a dataset path");
                    std::process::exit(2);
                }
            },
            "--json" => json = true,
            other if !other.starts_with('-') => questions.push(other.to_string()),
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(2);
            }
        }
        i += 1;
    }
    if questions.is_empty() && dataset.is_none() {
        eprintln!("Usage: syllabus-check <question>... [--json] | --eval <dataset.json>");
        std::process::exit(2);
    }

    let (config, settings) = load_config()?;
    let engine = ScopeEngine::open(settings, config.base_dir(), load_embedder()?)?;

    if let Some(path) = dataset {
        let items = load_dataset(&path)?;
        let (reports, summary) = engine.evaluate(&items)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        println!("📊 Evaluated {} questions from {}", summary.total, path.display());
        println!("  confidence: high={} medium={} low={}", summary.high_confidence, summary.medium_confidence, summary.low_confidence);
        println!("  ambiguous={}  excluded={}", summary.ambiguous, summary.excluded);
        println!("  accuracy: predicted={:.1}%  final={:.1}%", summary.predicted_accuracy() * 100.0, summary.final_accuracy() * 100.0);
        println!("  corrections={}  dual-tagged={}", summary.corrections_applied, summary.dual_tagged);
        if !summary.remaining_errors.is_empty() {
            println!("  remaining errors: {}", summary.remaining_errors.join(", "));
        }
        if engine.has_index() {
            let retrieval = engine.retrieval_hit_rate(&items)?;
            println!("  retrieval hit rate: {:.1}% ({}/{})", retrieval.hit_rate() * 100.0, retrieval.hits, retrieval.total);
        }
        return Ok(());
    }

    let decisions = engine.check_batch(&questions)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&decisions)?);
    } else {
        for d in &decisions {
            print_decision(d);
        }
    }
    Ok(())
}

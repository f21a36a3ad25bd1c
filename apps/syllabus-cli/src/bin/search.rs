use std::env;

use syllabus_cli::{flag_value, init_tracing, load_config, load_embedder, preview};
use syllabus_core::Unit;
use syllabus_engine::ScopeEngine;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: syllabus-search <query> [--k N] [--unit U] [--prioritized]");
        eprintln!("Example: syllabus-search 'tcp handshake' --k 3 --unit 4");
        std::process::exit(2);
    }
    let (config, settings) = load_config()?;
    let mut query = None;
    let mut k = settings.retrieval.default_k;
    let mut unit: Option<Unit> = None;
    let mut prioritized = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--k" | "-k" => k = flag_value(&args, &mut i, "--k"),
            "--unit" | "-u" => unit = Some(flag_value(&args, &mut i, "--unit")),
            "--prioritized" | "-p" => prioritized = true,
            other if !other.starts_with('-') => query = Some(other.to_string()),
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(2);
            }
        }
        i += 1;
    }
    let Some(query) = query else {
        eprintln!("Error: missing query");
        std::process::exit(2);
    };

    let engine = ScopeEngine::open(settings, config.base_dir(), load_embedder()?)?;
    let results = match (unit, prioritized) {
        (Some(unit), _) => engine.retrieve_by_unit(&query, unit, k)?,
        (None, true) => engine.retrieve_prioritized(&query, k)?,
        (None, false) => engine.retrieve(&query, k)?,
    };

    println!("🔍 Found {} results for: \"{query}\"", results.len());
    for (rank, r) in results.iter().enumerate() {
        let p = &r.passage;
        println!("\n  {}. score={:.4}  {}  {}  p.{}  [{}]", rank + 1, r.score, p.unit, p.source, p.page, p.topic);
        println!("     {}", preview(&p.text, 160));
    }
    Ok(())
}

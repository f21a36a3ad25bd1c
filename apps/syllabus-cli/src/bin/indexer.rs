use std::env;

use syllabus_cli::{flag_value, init_tracing, load_config, load_embedder};
use syllabus_engine::build_index;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let (config, settings) = load_config()?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut batch_size = 32usize;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--batch-size" | "-b" => batch_size = flag_value(&args, &mut i, "--batch-size"),
            other => {
                eprintln!("Usage: syllabus-indexer [--batch-size N]\nUnknown argument: {other}");
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let base = config.base_dir();
    println!("Syllabus Indexer\n================");
    println!("Corpus directory: {}", settings.data.corpus_dir(base).display());
    println!("Index directory:  {}", settings.data.index_dir(base).display());

    let embedder = load_embedder()?;
    let manifest = build_index(&settings, base, embedder.as_ref(), batch_size)?;

    println!("\n✅ Indexed {} passages (dim {}) with {}", manifest.count, manifest.dim, manifest.embedder_id);
    println!("💡 To search, use: cargo run --bin syllabus-search '<query>'");
    Ok(())
}

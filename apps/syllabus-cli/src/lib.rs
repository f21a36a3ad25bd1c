//! Shared plumbing for the syllabus binaries.

use std::process;
use std::sync::Arc;

use syllabus_core::config::{Config, Settings};
use syllabus_core::traits::Embedder;
use syllabus_embed::get_default_embedder;
use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Load and validate configuration from the working directory.
pub fn load_config() -> anyhow::Result<(Config, Settings)> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = config.settings()?;
    Ok((config, settings))
}

pub fn load_embedder() -> anyhow::Result<Arc<dyn Embedder>> {
    Ok(Arc::from(get_default_embedder()?))
}

/// Value following a flag such as `--k 5`, or exit with a usage error.
pub fn flag_value<T: std::str::FromStr>(args: &[String], i: &mut usize, flag: &str) -> T {
    let parsed = args.get(*i + 1).and_then(|v| v.parse::<T>().ok());
    match parsed {
        Some(v) => {
            *i += 1;
            v
        }
        None => {
            eprintln!("Error: {flag} requires a valid value");
            process::exit(2);
        }
    }
}

/// First `max` characters of `text` on one line.
pub fn preview(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

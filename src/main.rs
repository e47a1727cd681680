//! Minimal entry point. CLI tooling is out of scope for this crate (see
//! the non-goals in the design doc) — this binary only verifies that
//! configuration loads and logging initializes before handing control
//! back to whatever embeds the library.

use icegraph::config::EngineConfig;

fn main() {
    let config = match EngineConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    icegraph::config::init_tracing(&config.logging);
    tracing::info!(warehouse_path = %config.warehouse_path, "icegraph configured");
}

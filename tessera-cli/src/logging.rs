//! Diagnostics go to stderr so that stdout only carries summaries and locations.

use std::io::IsTerminal;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Targets raised by `-v`: the schema libraries and this binary.
const TESSERA_TARGETS: [&str; 3] = ["tessera_schema", "tessera_hilbert", "tsr"];

/// Installs the stderr subscriber, which also receives the `log` records of the libraries.
///
/// `RUST_LOG` wins over `verbosity` when it is set.
pub fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directives(verbosity))
            .with_context(|| format!("invalid log filter for verbosity {verbosity}"))?,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
    Ok(())
}

/// Warnings only, then `debug` for our own targets at `-v` and `trace` from `-vv` on.
fn directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => return "warn".to_string(),
        1 => "debug",
        _ => "trace",
    };
    let mut directives = vec!["warn".to_string()];
    directives.extend(TESSERA_TARGETS.map(|target| format!("{target}={level}")));
    directives.join(",")
}

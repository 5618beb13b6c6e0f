//! Diagnostic logging setup.
//!
//! Everything in the crate logs through `tracing`; the binary installs a
//! stderr subscriber so streamed output on stdout stays clean.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "STREAMCHAT_LOG";

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "streamchat=warn",
        1 => "streamchat=info",
        2 => "streamchat=debug",
        _ => "streamchat=trace",
    }
}

/// Install the global subscriber. `STREAMCHAT_LOG` overrides the verbosity
/// derived from `-v` flags. Calling this twice is harmless.
pub fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("streamchat=debug"))
        .try_init();
}

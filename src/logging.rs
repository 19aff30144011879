use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_ENV: &str = "CHESS_LOG";
pub const LOG_FORMAT_ENV: &str = "CHESS_LOG_FORMAT";

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "chess_notion=debug,info"
    } else {
        "chess_notion=info,warn"
    }
}

/// Installs the global subscriber. Output goes to stderr so that command
/// output on stdout stays machine-readable.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let format = env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

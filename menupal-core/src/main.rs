use std::io::{self, BufRead, Write};
use std::panic::AssertUnwindSafe;

use menupal_core::config::CoreConfig;
use menupal_core::protocol::{self, Core};
use tracing_subscriber::EnvFilter;

fn main() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = CoreConfig::from_env();
    tracing::info!(data_dir = %config.data_dir.display(), endpoint = %config.endpoint, "starting menupal-core");

    let core = match Core::open(&config) {
        Ok(core) => core,
        Err(e) => {
            tracing::error!(error = %e, "failed to start");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| protocol::handle(&core, &line)));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => {
                tracing::error!("request handler panicked");
                serde_json::json!({
                    "status": "error",
                    "message": "internal core error"
                })
                .to_string()
            }
        };

        if writeln!(stdout, "{response}").is_err() {
            break;
        }

        let _ = stdout.flush();
    }
}

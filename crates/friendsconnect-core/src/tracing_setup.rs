use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::constants::env;

pub fn init_tracing() {
    init_tracing_with_service("friendsconnect");
}

pub fn init_tracing_with_service(service_name: &str) {
    // RUST_LOG wins when set
    let default_directives = format!("{}=info,friendsconnect_core=info", service_name.replace('-', "_"));
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    // Optional debug log file, enabled via environment variable
    let file_layer = std::env::var(env::LOG_FILE).ok().and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => {
                eprintln!("File logging enabled: {}", log_path);
                Some(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_target(true)
                        .with_filter(LevelFilter::DEBUG),
                )
            }
            Err(e) => {
                eprintln!("Could not open log file {}: {}", log_path, e);
                None
            }
        }
    });

    // A second init (tests, embedding) keeps the first subscriber
    let _ = registry.with(file_layer).try_init();
}

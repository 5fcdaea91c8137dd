use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging() {
    // Load .env first so RUST_LOG and credentials from it take effect
    dotenv().ok();
    common::utils::logging::init_logging_from_env();
    info!(service = "weather-relay", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> ExitCode {
    init_logging();

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "weather-relay",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    // Fatal before anything binds: missing credentials never reach the listener.
    let config = match configs::load_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "weather-relay", event = "config_invalid", error = %e, "refusing to start");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(service = "weather-relay", event = "config_loaded", config = ?config, "configuration loaded");

    let worker_threads = config.server.worker_threads;
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(
                service = "weather-relay",
                event = "runtime_build_failed",
                error = %e,
                "failed to build tokio runtime"
            );
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "weather-relay",
        event = "start",
        %service_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "weather relay starting"
    );

    match rt.block_on(server::run(config)) {
        Ok(()) => {
            info!(service = "weather-relay", event = "stop", %service_id, pid, "weather relay stopped normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "weather-relay", event = "run_failed", error = %e, "server::run returned error");
            ExitCode::FAILURE
        }
    }
}

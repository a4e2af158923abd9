//! # Sched Server - Entry Point
//! src/main.rs
//!
//! Lee la configuración (CLI + variables de entorno), inicia el logging,
//! valida y arranca el servidor.

use clap::Parser;
use sched_server::config::Config;
use sched_server::logging::init_logging;
use sched_server::server::Server;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let config = Config::parse();

    if let Err(e) = init_logging(&config.log_config()) {
        eprintln!("sched_server: {}", e);
        return ExitCode::FAILURE;
    }

    config.log_summary();

    // Falla antes de crear cualquier thread
    let mut server = match Server::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run() {
        error!(error = %e, "fatal error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

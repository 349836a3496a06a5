//! # Static Server - Entry Point
//! src/main.rs
//!
//! Uso: `server <port> <webroot-path> [opciones]`
//!
//! SIGINT / SIGTERM disparan un apagado ordenado: se deja de aceptar, se
//! terminan las conexiones encoladas y se hace join de los workers.

use anyhow::Context;
use static_server::config::ServerConfig;
use static_server::server::Server;
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    // Argumentos inválidos: clap imprime el uso y sale con código != 0
    let config = ServerConfig::from_args();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(config.log_level)
        .init();

    info!(config = %config.summary_json(), "Iniciando servidor de archivos estáticos");

    let server = Server::bind(config)
        .inspect_err(|e| error!(error = %e, "Error fatal al arrancar"))
        .context("cannot start server")?;

    let signal = server.shutdown_signal();
    if let Err(e) = ctrlc::set_handler(move || signal.trigger()) {
        warn!(error = %e, "No se pudo instalar el handler de señales");
    }

    server
        .run()
        .inspect_err(|e| error!(error = %e, "Error fatal"))
        .context("server failed")?;

    Ok(())
}

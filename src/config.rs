//! # Configuración del Servidor
//! src/config.rs
//!
//! Define la configuración del servidor de archivos estáticos a partir de
//! los argumentos de línea de comandos. La configuración es inmutable una vez
//! que arranca el servidor y se comparte con el listener y cada worker.
//!
//! ## Ejemplos de uso
//!
//! ```bash
//! ./server 8080 ./public
//! ./server 8080 ./public --workers 16 --queue-capacity 256 --request-timeout-ms 5000
//! ```

use crate::error::ServerError;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

/// Largo de la request line más corta posible: `GET / HTTP/1.0\r\n`
pub const MIN_REQUEST_BYTES: usize = 16;

/// Configuración del servidor de archivos estáticos
#[derive(Debug, Clone, Parser, Serialize)]
#[command(name = "server")]
#[command(about = "Servidor HTTP de archivos estáticos con pool fijo de workers")]
#[command(version = "0.1.0")]
pub struct ServerConfig {
    /// Puerto en el que escucha el servidor
    pub port: u16,

    /// Directorio raíz desde donde se sirven los archivos
    pub root: PathBuf,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Backlog del socket (conexiones pendientes de accept)
    #[arg(long, default_value = "128")]
    pub backlog: i32,

    // === Workers ===

    /// Número fijo de workers que procesan conexiones
    #[arg(long, default_value = "8")]
    pub workers: usize,

    /// Capacidad máxima de la cola de conexiones aceptadas
    #[arg(long = "queue-capacity", default_value = "64")]
    pub queue_capacity: usize,

    // === Límites por request ===

    /// Tiempo máximo para atender un request, en milisegundos
    #[arg(long = "request-timeout-ms", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Máximo de bytes leídos buscando la request line
    #[arg(long = "max-request-bytes", default_value = "8192")]
    pub max_request_bytes: usize,

    /// Nivel máximo de logging (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "info")]
    #[serde(skip)]
    pub log_level: tracing::Level,
}

impl ServerConfig {
    /// Crea la configuración parseando los argumentos CLI
    ///
    /// Si faltan argumentos o son inválidos, clap imprime el uso y termina
    /// el proceso con código distinto de cero antes de abrir ningún socket.
    pub fn from_args() -> Self {
        ServerConfig::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use static_server::config::ServerConfig;
    ///
    /// let config = ServerConfig::default();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.workers == 0 {
            return Err(ServerError::Config("workers must be >= 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(ServerError::Config("queue capacity must be >= 1".to_string()));
        }
        if self.backlog <= 0 {
            return Err(ServerError::Config("backlog must be >= 1".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ServerError::Config("request timeout must be > 0".to_string()));
        }
        if self.max_request_bytes < MIN_REQUEST_BYTES {
            return Err(ServerError::Config(format!(
                "max request bytes must be >= {}",
                MIN_REQUEST_BYTES
            )));
        }

        Ok(())
    }

    /// Resumen de la configuración en JSON, para el log de arranque
    pub fn summary_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

impl Default for ServerConfig {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            root: PathBuf::from("."),
            host: "0.0.0.0".to_string(),
            backlog: 128,
            workers: 8,
            queue_capacity: 64,
            request_timeout_ms: 30_000,
            max_request_bytes: 8192,
            log_level: tracing::Level::INFO,
        }
    }
}

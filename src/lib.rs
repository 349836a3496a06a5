//! # Static Server
//! src/lib.rs
//!
//! Servidor HTTP de archivos estáticos: acepta conexiones TCP, lee la
//! request line, resuelve la ruta contra un web root y responde con el
//! archivo (200) o con un 404. Un archivo por conexión, y se cierra.
//!
//! ## Arquitectura
//!
//! - `config`: argumentos CLI y validación
//! - `server`: socket de escucha, accept loop, pipeline por conexión y apagado
//! - `workers`: cola acotada y pool fijo de workers
//! - `resolver`: web root -> archivo, con protección contra traversal
//! - `http`: request line, respuestas y tabla MIME
//! - `metrics`: estadísticas por resultado de conexión
//!
//! ```text
//! Listener -> WorkQueue -> worker -> Pipeline -> PathResolver/mime -> respuesta -> close
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use static_server::config::ServerConfig;
//! use static_server::server::Server;
//!
//! let mut config = ServerConfig::default();
//! config.root = "./public".into();
//!
//! let server = Server::bind(config).expect("Error al iniciar servidor");
//! let signal = server.shutdown_signal();
//! // signal.trigger() desde otro thread detiene el servidor
//! server.run().expect("Error en el servidor");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod resolver;
pub mod server;
pub mod workers;

#[cfg(test)]
mod test_support;

pub use config::ServerConfig;
pub use error::{PipelineError, ServerError};
pub use server::{Server, ShutdownSignal};

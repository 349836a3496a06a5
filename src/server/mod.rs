//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! - `tcp`: socket de escucha y accept loop
//! - `pipeline`: lo que hace un worker con cada conexión
//! - `shutdown`: señal de apagado compartida

pub mod pipeline;
pub mod shutdown;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use pipeline::{Outcome, Pipeline};
pub use shutdown::ShutdownSignal;
pub use tcp::Server;

//! # Errores del Servidor
//! src/error.rs
//!
//! Dos familias de errores con alcance distinto:
//!
//! - [`ServerError`]: errores fatales de arranque (socket, bind, listen,
//!   configuración). El proceso no puede continuar.
//! - [`PipelineError`]: errores de una sola conexión. El worker los registra,
//!   cierra la conexión y sigue atendiendo la cola.
//!
//! Un archivo inexistente o con extensión no soportada NO es un error: es una
//! resolución `NotFound` normal que produce un 404.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errores fatales durante el arranque del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuración inválida
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// El web root no existe o no es un directorio
    #[error("Invalid web root {}: {source}", path.display())]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Falla al crear, configurar, enlazar o poner a escuchar el socket
    #[error("Socket error during {stage}: {source}")]
    Socket {
        stage: &'static str,
        #[source]
        source: io::Error,
    },

    /// Cualquier otro error de I/O del proceso
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errores recuperables del pipeline de una conexión
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error de lectura/escritura en el socket
    #[error("Connection I/O error: {0}")]
    Io(#[from] io::Error),

    /// No apareció un fin de línea dentro del límite configurado
    #[error("Request line exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    /// La request line no tiene la forma `METHOD URI VERSION`
    #[error("Malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// La request line no es UTF-8 válido
    #[error("Request line is not valid UTF-8")]
    InvalidEncoding,

    /// El archivo resuelto no se pudo abrir o leer
    #[error("Cannot read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Se leyeron menos bytes de los que reportaba el archivo
    #[error("Short read on {}: expected {expected} bytes, got {actual}", path.display())]
    ShortRead {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Se agotó el tiempo máximo del request
    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

impl PipelineError {
    /// Nombre corto para estadísticas y logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Io(_) => "io",
            PipelineError::RequestTooLarge { .. } => "request_too_large",
            PipelineError::MalformedRequestLine(_) => "malformed_request",
            PipelineError::InvalidEncoding => "invalid_encoding",
            PipelineError::FileRead { .. } => "file_read",
            PipelineError::ShortRead { .. } => "short_read",
            PipelineError::DeadlineExceeded => "deadline_exceeded",
        }
    }

    /// Convierte errores de socket, tratando los timeouts como fin del plazo
    pub(crate) fn from_socket(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => PipelineError::DeadlineExceeded,
            _ => PipelineError::Io(err),
        }
    }
}

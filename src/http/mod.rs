//! # Módulo HTTP
//!
//! Lo mínimo del protocolo que necesita un servidor de archivos estáticos:
//!
//! - Lectura y parsing de la request line
//! - Construcción de las dos respuestas posibles (200 y 404)
//! - Tabla de tipos MIME
//!
//! ### Formato de Request
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n      (ignorado)
//! \r\n
//! ```
//!
//! No hay keep-alive, chunked ni parsing de headers: un archivo por
//! conexión y se cierra.

pub mod mime;
pub mod request;
pub mod response;
pub mod status;

pub use request::{read_request_line, RequestLine};
pub use response::Response;
pub use status::StatusCode;

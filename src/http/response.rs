//! # Construcción de Respuestas HTTP
//!
//! Arma la respuesta completa en memoria y la convierte a bytes de una sola
//! vez, así nunca sale una respuesta a medias por el socket.
//!
//! ## Formatos
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 12\r\n
//! \r\n
//! hello world!
//! ```
//!
//! ```text
//! HTTP/1.1 404 Not Found\r\n
//! Content-Length: 0\r\n
//! \r\n
//! ```
//!
//! La versión de la status line es la que mandó el cliente.

use super::StatusCode;
use std::io::{self, Write};

/// Respuesta HTTP completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Versión que se repite en la status line (ej: "HTTP/1.1")
    version: String,

    /// Código de estado HTTP
    status: StatusCode,

    /// Headers en el orden en que se escriben
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(version: &str, status: StatusCode) -> Self {
        Self {
            version: version.to_string(),
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Respuesta 200 con el contenido del archivo
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::Response;
    ///
    /// let response = Response::found("HTTP/1.1", "text/html", b"hello world!".to_vec());
    /// let text = String::from_utf8(response.to_bytes()).unwrap();
    /// assert_eq!(
    ///     text,
    ///     "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 12\r\n\r\nhello world!"
    /// );
    /// ```
    pub fn found(version: &str, content_type: &str, body: Vec<u8>) -> Self {
        Self::new(version, StatusCode::Ok)
            .with_header("Content-Type", content_type)
            .with_body_bytes(body)
    }

    /// Respuesta 404 con `Content-Length: 0` y sin body
    pub fn not_found(version: &str) -> Self {
        Self::new(version, StatusCode::NotFound).with_body_bytes(Vec::new())
    }

    /// Agrega un header; si ya existe, se reemplaza su valor en su posición
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match self.headers.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        self
    }

    /// Establece el body y su `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        let length = body.len().to_string();
        self.body = body;
        self.with_header("Content-Length", &length)
    }

    /// Status line, headers y la línea vacía final
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = Vec::with_capacity(128);

        // 1. Status line
        head.extend_from_slice(format!("{} {}\r\n", self.version, self.status).as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            head.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        head.extend_from_slice(b"\r\n");

        head
    }

    /// Convierte la respuesta completa a bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    /// Escribe la respuesta en `writer` sin copiar el body
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.head_bytes())?;
        writer.write_all(&self.body)?;
        writer.flush()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene un header específico
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

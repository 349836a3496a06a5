//! # Lectura y Parsing de la Request Line
//! src/http/request.rs
//!
//! Del request sólo interesa la primera línea:
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! ```
//!
//! Los headers y el body, si llegan, se ignoran. La lectura avanza por
//! bloques hasta encontrar el fin de línea, con un límite de bytes para que
//! un cliente no pueda hacer crecer el buffer sin control.

use crate::error::PipelineError;
use std::io::{self, Read};

/// Tamaño de cada lectura del socket
const READ_CHUNK: usize = 1024;

/// Request line parseada: `METHOD URI VERSION`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Método HTTP tal como llegó (no se restringe)
    method: String,

    /// URI pedida (ej: "/index.html?v=2")
    uri: String,

    /// Versión HTTP, se repite en la status line de la respuesta
    version: String,
}

impl RequestLine {
    /// Parsea la request line (sin el fin de línea)
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use static_server::http::RequestLine;
    ///
    /// let line = RequestLine::parse(b"GET /index.html HTTP/1.1").unwrap();
    /// assert_eq!(line.method(), "GET");
    /// assert_eq!(line.path(), "/index.html");
    /// assert_eq!(line.version(), "HTTP/1.1");
    /// ```
    pub fn parse(line: &[u8]) -> Result<Self, PipelineError> {
        let line = std::str::from_utf8(line).map_err(|_| PipelineError::InvalidEncoding)?;
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD URI VERSION
        if parts.len() != 3 {
            return Err(PipelineError::MalformedRequestLine(line.to_string()));
        }

        let (method, uri, version) = (parts[0], parts[1], parts[2]);

        if !uri.starts_with('/') || !version.starts_with("HTTP/") {
            return Err(PipelineError::MalformedRequestLine(line.to_string()));
        }

        Ok(RequestLine {
            method: method.to_string(),
            uri: uri.to_string(),
            version: version.to_string(),
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// La URI sin query string ni fragmento
    pub fn path(&self) -> &str {
        let end = self.uri.find(['?', '#']).unwrap_or(self.uri.len());
        &self.uri[..end]
    }
}

/// Lee desde `reader` hasta encontrar la primera línea del request
///
/// # Retorna
///
/// * `Ok(Some(line))` - La línea sin `\r\n` (o `\n`)
/// * `Ok(None)` - El cliente cerró sin mandar nada
/// * `Err(RequestTooLarge)` - La línea no cabe en `limit` bytes
///
/// Si el cliente cierra a mitad de línea, se devuelve lo que haya llegado y
/// el parser decide si sirve.
pub fn read_request_line<R: Read>(reader: &mut R, limit: usize) -> Result<Option<Vec<u8>>, PipelineError> {
    let mut buffer = Vec::with_capacity(READ_CHUNK.min(limit));
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let bytes_read = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PipelineError::from_socket(e)),
        };

        if bytes_read == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            break;
        }

        let scan_from = buffer.len();
        buffer.extend_from_slice(&chunk[..bytes_read]);

        if let Some(pos) = buffer[scan_from..].iter().position(|&b| b == b'\n') {
            let line_end = scan_from + pos;
            if line_end + 1 > limit {
                return Err(PipelineError::RequestTooLarge { limit });
            }
            buffer.truncate(line_end);
            break;
        }

        if buffer.len() >= limit {
            return Err(PipelineError::RequestTooLarge { limit });
        }
    }

    if buffer.last() == Some(&b'\r') {
        buffer.pop();
    }

    Ok(Some(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader que entrega los datos de a pocos bytes, como un socket lento
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let end = (self.pos + self.step).min(self.data.len());
            let n = (end - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_parse_simple_get() {
        let line = RequestLine::parse(b"GET / HTTP/1.0").unwrap();
        assert_eq!(line.method(), "GET");
        assert_eq!(line.uri(), "/");
        assert_eq!(line.version(), "HTTP/1.0");
    }

    #[test]
    fn test_parse_any_method() {
        let line = RequestLine::parse(b"DELETE /a.css HTTP/1.1").unwrap();
        assert_eq!(line.method(), "DELETE");
    }

    #[test]
    fn test_path_strips_query_and_fragment() {
        let line = RequestLine::parse(b"GET /app.js?v=2 HTTP/1.1").unwrap();
        assert_eq!(line.uri(), "/app.js?v=2");
        assert_eq!(line.path(), "/app.js");

        let line = RequestLine::parse(b"GET /index.html#top HTTP/1.1").unwrap();
        assert_eq!(line.path(), "/index.html");
    }

    #[test]
    fn test_parse_missing_tokens() {
        assert!(matches!(
            RequestLine::parse(b"GET"),
            Err(PipelineError::MalformedRequestLine(_))
        ));
        assert!(matches!(
            RequestLine::parse(b"GET /index.html"),
            Err(PipelineError::MalformedRequestLine(_))
        ));
        assert!(matches!(
            RequestLine::parse(b""),
            Err(PipelineError::MalformedRequestLine(_))
        ));
    }

    #[test]
    fn test_parse_extra_tokens() {
        assert!(RequestLine::parse(b"GET /a b.html HTTP/1.1").is_err());
    }

    #[test]
    fn test_parse_invalid_uri_or_version() {
        assert!(RequestLine::parse(b"GET index.html HTTP/1.1").is_err());
        assert!(RequestLine::parse(b"GET /index.html FTP/1.0").is_err());
    }

    #[test]
    fn test_parse_invalid_utf8() {
        assert!(matches!(
            RequestLine::parse(b"GET /\xff\xfe HTTP/1.1"),
            Err(PipelineError::InvalidEncoding)
        ));
    }

    #[test]
    fn test_read_line_with_crlf() {
        let mut input = Cursor::new(b"GET /index.html HTTP/1.1\r\nHost: x\r\n\r\n".to_vec());
        let line = read_request_line(&mut input, 8192).unwrap().unwrap();
        assert_eq!(line, b"GET /index.html HTTP/1.1");
    }

    #[test]
    fn test_read_line_with_bare_lf() {
        let mut input = Cursor::new(b"GET / HTTP/1.0\n".to_vec());
        let line = read_request_line(&mut input, 8192).unwrap().unwrap();
        assert_eq!(line, b"GET / HTTP/1.0");
    }

    #[test]
    fn test_read_line_across_many_reads() {
        let mut input = Trickle {
            data: b"GET /some/deep/path/style.css HTTP/1.1\r\n\r\n".to_vec(),
            pos: 0,
            step: 3,
        };
        let line = read_request_line(&mut input, 8192).unwrap().unwrap();
        assert_eq!(line, b"GET /some/deep/path/style.css HTTP/1.1");
    }

    #[test]
    fn test_read_line_peer_closed_immediately() {
        let mut input = Cursor::new(Vec::new());
        assert!(read_request_line(&mut input, 8192).unwrap().is_none());
    }

    #[test]
    fn test_read_line_eof_without_newline() {
        let mut input = Cursor::new(b"GET /a.js HTTP/1.1".to_vec());
        let line = read_request_line(&mut input, 8192).unwrap().unwrap();
        assert_eq!(line, b"GET /a.js HTTP/1.1");
    }

    #[test]
    fn test_read_line_too_large() {
        let mut data = b"GET /".to_vec();
        data.extend(std::iter::repeat(b'a').take(5000));
        data.extend_from_slice(b".html HTTP/1.1\r\n");
        let mut input = Cursor::new(data);

        assert!(matches!(
            read_request_line(&mut input, 1024),
            Err(PipelineError::RequestTooLarge { limit: 1024 })
        ));
    }

    #[test]
    fn test_read_line_exactly_at_limit() {
        let raw = b"GET / HTTP/1.0\r\n";
        let mut input = Cursor::new(raw.to_vec());
        assert!(read_request_line(&mut input, raw.len()).unwrap().is_some());

        let mut input = Cursor::new(raw.to_vec());
        assert!(read_request_line(&mut input, raw.len() - 1).is_err());
    }
}

//! # Pipeline de una Conexión
//! src/server/pipeline.rs
//!
//! Lo que ejecuta un worker por cada conexión, en una sola pasada:
//!
//! ```text
//! ReadRequest -> ParseRequestLine -> ResolvePath -> (ReadFile) -> WriteResponse -> Close
//! ```
//!
//! Cualquier error queda contenido en la conexión: se registra, se cierra
//! el socket y el worker vuelve a la cola. El archivo se lee completo antes
//! de escribir el primer byte, así el cliente sólo ve un 200 o un 404
//! completos, o la conexión cerrada.

use crate::config::ServerConfig;
use crate::error::PipelineError;
use crate::http::{read_request_line, RequestLine, Response, StatusCode};
use crate::metrics::ConnectionStats;
use crate::resolver::{Miss, PathResolver, Resolution};
use std::fs::File;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tiempo máximo esperando que el cliente cierre después de la respuesta
const LINGER_TIMEOUT: Duration = Duration::from_millis(200);

/// Máximo de bytes sobrantes del request que se descartan al cerrar
const LINGER_MAX_BYTES: usize = 64 * 1024;

/// Cómo terminó una conexión sin errores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Se envió una respuesta completa
    Responded { status: StatusCode, body_bytes: usize },

    /// El cliente cerró sin mandar request
    PeerClosed,
}

/// Estado compartido (sólo lectura) por todos los workers
pub struct Pipeline {
    resolver: PathResolver,
    stats: ConnectionStats,
    request_timeout: Duration,
    max_request_bytes: usize,
}

impl Pipeline {
    pub fn new(config: &ServerConfig, resolver: PathResolver, stats: ConnectionStats) -> Self {
        Self {
            resolver,
            stats,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            max_request_bytes: config.max_request_bytes,
        }
    }

    /// Procesa una conexión completa y la cierra
    ///
    /// Toma el stream por valor: al retornar, el socket queda cerrado en
    /// todos los caminos.
    pub fn handle(&self, stream: TcpStream) {
        let start = Instant::now();
        let deadline = start + self.request_timeout;

        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let mut conn = DeadlineStream::new(&stream, deadline);

        match self.serve(&mut conn) {
            Ok(Outcome::Responded { status, body_bytes }) => {
                debug!(%peer, status = status.as_u16(), body_bytes, elapsed_ms = start.elapsed().as_millis() as u64, "Respuesta enviada");
                self.stats.record_response(status, body_bytes, start.elapsed());
            }
            Ok(Outcome::PeerClosed) => {
                debug!(%peer, "Conexión cerrada por el cliente sin request");
                self.stats.record_peer_closed(start.elapsed());
            }
            Err(e) => {
                warn!(%peer, kind = e.kind(), error = %e, "Conexión abortada");
                self.stats.record_aborted(e.kind(), start.elapsed());
            }
        }

        let request_complete = conn.request_complete();
        linger(&stream, deadline, request_complete);
    }

    /// Ejecuta las etapas del pipeline sobre la conexión
    fn serve(&self, conn: &mut DeadlineStream<'_>) -> Result<Outcome, PipelineError> {
        // 1. ReadRequest
        let raw = match read_request_line(conn, self.max_request_bytes)? {
            Some(raw) => raw,
            None => return Ok(Outcome::PeerClosed),
        };

        // 2. ParseRequestLine
        let request = RequestLine::parse(&raw)?;
        debug!(method = request.method(), uri = request.uri(), version = request.version(), "Request");

        // 3. ResolvePath (+ lectura completa del archivo)
        let response = match self.resolver.resolve(request.path()) {
            Resolution::Found { path, content_type } => {
                let body = read_file(&path)?;
                Response::found(request.version(), content_type, body)
            }
            Resolution::NotFound {
                reason: Miss::OutsideRoot,
                ..
            } => {
                warn!(uri = request.uri(), "Intento de salir del web root");
                Response::not_found(request.version())
            }
            Resolution::NotFound { path, reason } => {
                debug!(path = %path.display(), %reason, "Recurso no encontrado");
                Response::not_found(request.version())
            }
        };

        // 4. WriteResponse
        response.write_to(conn).map_err(PipelineError::from_socket)?;

        Ok(Outcome::Responded {
            status: response.status(),
            body_bytes: response.body().len(),
        })
    }
}

/// Lee el archivo completo, verificando que se leyó todo lo que reporta su tamaño
fn read_file(path: &Path) -> Result<Vec<u8>, PipelineError> {
    let file_error = |source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(file_error)?;
    let expected = file.metadata().map_err(file_error)?.len();

    read_exact_len(file, expected, path)
}

/// Lee exactamente `expected` bytes de `reader`; menos es un `ShortRead`
fn read_exact_len<R: Read>(reader: R, expected: u64, path: &Path) -> Result<Vec<u8>, PipelineError> {
    let file_error = |source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    };

    let capacity = usize::try_from(expected).map_err(|_| {
        file_error(io::Error::new(io::ErrorKind::OutOfMemory, "file too large for memory"))
    })?;

    let mut body = Vec::with_capacity(capacity);
    reader.take(expected).read_to_end(&mut body).map_err(file_error)?;

    if body.len() as u64 != expected {
        return Err(PipelineError::ShortRead {
            path: path.to_path_buf(),
            expected,
            actual: body.len() as u64,
        });
    }

    Ok(body)
}

/// Cierre ordenado: se cierra la escritura y se descarta lo que quede del
/// request, para que el cliente lea la respuesta en vez de un reset
///
/// Si ya llegó la línea vacía que cierra los headers, sólo se descarta lo
/// que esté en el buffer del socket y no se espera al cliente. Si no, se
/// espera hasta `LINGER_TIMEOUT` a que termine de mandar o cierre.
fn linger(stream: &TcpStream, deadline: Instant, request_complete: bool) {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return;
    }

    let _ = stream.shutdown(Shutdown::Write);

    let configured = if request_complete {
        stream.set_nonblocking(true)
    } else {
        stream.set_read_timeout(Some(remaining.min(LINGER_TIMEOUT)))
    };
    if configured.is_err() {
        return;
    }

    let mut sink = [0u8; 1024];
    let mut drained = 0;
    let mut reader = stream;
    while drained < LINGER_MAX_BYTES {
        match reader.read(&mut sink) {
            Ok(0) | Err(_) => break,
            Ok(n) => drained += n,
        }
    }
}

/// Detecta la línea vacía que cierra los headers, aunque llegue partida
/// entre dos lecturas
#[derive(Debug, Default)]
struct RequestEnd {
    tail: Vec<u8>,
    seen: bool,
}

impl RequestEnd {
    fn observe(&mut self, bytes: &[u8]) {
        if self.seen || bytes.is_empty() {
            return;
        }

        let mut window = std::mem::take(&mut self.tail);
        window.extend_from_slice(bytes);

        self.seen = window.windows(4).any(|w| w == b"\r\n\r\n")
            || window.windows(2).any(|w| w == b"\n\n");

        let keep_from = window.len().saturating_sub(3);
        self.tail = window.split_off(keep_from);
    }
}

/// Socket con plazo: antes de cada lectura/escritura aplica como timeout el
/// tiempo que le queda al request
struct DeadlineStream<'a> {
    stream: &'a TcpStream,
    deadline: Instant,
    request_end: RequestEnd,
}

impl<'a> DeadlineStream<'a> {
    fn new(stream: &'a TcpStream, deadline: Instant) -> Self {
        Self {
            stream,
            deadline,
            request_end: RequestEnd::default(),
        }
    }

    fn remaining(&self) -> io::Result<Duration> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "request deadline exceeded"));
        }
        Ok(remaining)
    }

    /// Si ya se leyó el request completo (hasta el fin de los headers)
    fn request_complete(&self) -> bool {
        self.request_end.seen
    }
}

impl Read for DeadlineStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.set_read_timeout(Some(self.remaining()?))?;
        let mut stream = self.stream;
        let n = stream.read(buf)?;
        self.request_end.observe(&buf[..n]);
        Ok(n)
    }
}

impl Write for DeadlineStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.set_write_timeout(Some(self.remaining()?))?;
        let mut stream = self.stream;
        stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut stream = self.stream;
        stream.flush()
    }
}

//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Dueño del socket de escucha. Un único thread corre el accept loop y
//! entrega cada conexión aceptada al pool de workers; la cola acotada del
//! pool frena al accept loop cuando los workers no dan abasto.
//!
//! El accept loop es no bloqueante y consulta la [`ShutdownSignal`] entre
//! intentos, así el apagado no depende de que llegue otra conexión.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::metrics::{ConnectionStats, StatsSnapshot};
use crate::resolver::PathResolver;
use crate::server::pipeline::Pipeline;
use crate::server::shutdown::ShutdownSignal;
use crate::workers::{QueueClosed, WorkerPool};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cada cuánto revisa el accept loop la señal de apagado cuando no hay conexiones
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Servidor de archivos estáticos
pub struct Server {
    config: Arc<ServerConfig>,
    listener: TcpListener,
    pipeline: Arc<Pipeline>,
    stats: ConnectionStats,
    shutdown: ShutdownSignal,
}

impl Server {
    /// Valida la configuración, abre el web root y deja el socket escuchando
    ///
    /// Cualquier falla acá es fatal: el proceso no puede arrancar.
    pub fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let resolver = PathResolver::new(&config.root)?;
        info!(root = %resolver.root().display(), "Web root listo");

        let listener = bind_listener(&config)?;
        let stats = ConnectionStats::new();
        let pipeline = Pipeline::new(&config, resolver, stats.clone());

        Ok(Self {
            config: Arc::new(config),
            listener,
            pipeline: Arc::new(pipeline),
            stats,
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Dirección real en la que escucha (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Token para pedir el apagado desde otro thread o un handler de señales
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Corre el servidor hasta que se dispare la señal de apagado
    ///
    /// Al apagarse deja de aceptar, cierra el socket de escucha, espera a que
    /// los workers terminen las conexiones encoladas y retorna las
    /// estadísticas finales.
    pub fn run(self) -> Result<StatsSnapshot, ServerError> {
        let Server {
            config,
            listener,
            pipeline,
            stats,
            shutdown,
        } = self;

        let mut pool = WorkerPool::start(config.workers, config.queue_capacity, move |stream: TcpStream| {
            pipeline.handle(stream)
        })?;

        listener
            .set_nonblocking(true)
            .map_err(|source| ServerError::Socket {
                stage: "set_nonblocking",
                source,
            })?;

        info!(address = %listener.local_addr()?, "Esperando conexiones");
        accept_loop(&listener, &pool, &shutdown, &stats);

        info!("Apagando servidor");
        drop(listener);
        pool.shutdown();

        info!(stats = %stats.to_json(), "Servidor detenido");
        Ok(stats.snapshot())
    }
}

/// Crea el socket, activa SO_REUSEADDR, hace bind y listen con el backlog configurado
fn bind_listener(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let address = config.address();
    let addr = address
        .to_socket_addrs()
        .map_err(|e| ServerError::Config(format!("invalid address {}: {}", address, e)))?
        .next()
        .ok_or_else(|| ServerError::Config(format!("address {} did not resolve", address)))?;

    let socket_error = |stage: &'static str| move |source| ServerError::Socket { stage, source };

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(socket_error("socket"))?;
    debug!("Socket de escucha creado");

    // Permite reusar el puerto aunque queden conexiones en TIME_WAIT
    socket.set_reuse_address(true).map_err(socket_error("setsockopt"))?;

    socket.bind(&addr.into()).map_err(socket_error("bind"))?;
    socket.listen(config.backlog).map_err(socket_error("listen"))?;

    let listener: TcpListener = socket.into();
    info!(address = %listener.local_addr()?, backlog = config.backlog, "Servidor escuchando");

    Ok(listener)
}

/// Acepta conexiones y las entrega al pool hasta que se pida el apagado
fn accept_loop(
    listener: &TcpListener,
    pool: &WorkerPool<TcpStream>,
    shutdown: &ShutdownSignal,
    stats: &ConnectionStats,
) {
    while !shutdown.is_triggered() {
        match listener.accept() {
            Ok((stream, peer)) => {
                // El socket aceptado debe ser bloqueante para el worker
                if let Err(e) = stream.set_nonblocking(false) {
                    warn!(%peer, error = %e, "No se pudo configurar la conexión");
                    continue;
                }

                debug!(%peer, queued = pool.queued(), "Nueva conexión");
                stats.record_accepted();

                if let Err(QueueClosed(_stream)) = pool.submit(stream) {
                    warn!(%peer, "Pool cerrado; se descarta la conexión");
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                shutdown.wait_timeout(ACCEPT_POLL_INTERVAL);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                // Recuperable: se registra y se sigue aceptando
                warn!(error = %e, "Error al aceptar conexión");
                shutdown.wait_timeout(ACCEPT_POLL_INTERVAL);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempRoot;
    use std::io::{Read, Write};
    use std::thread;

    fn test_config(root: &TempRoot) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.host = "127.0.0.1".to_string();
        config.port = 0;
        config.root = root.path().to_path_buf();
        config.workers = 2;
        config.queue_capacity = 4;
        config
    }

    #[test]
    fn test_bind_rejects_invalid_config() {
        let root = TempRoot::new("tcp_invalid_config");
        let mut config = test_config(&root);
        config.workers = 0;

        assert!(matches!(Server::bind(config), Err(ServerError::Config(_))));
    }

    #[test]
    fn test_bind_rejects_missing_root() {
        let root = TempRoot::new("tcp_missing_root");
        let mut config = test_config(&root);
        config.root = root.path().join("nope");

        assert!(matches!(Server::bind(config), Err(ServerError::InvalidRoot { .. })));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_bind_port_in_use() {
        let root = TempRoot::new("tcp_in_use");
        let first = Server::bind(test_config(&root)).unwrap();
        let port = first.local_addr().unwrap().port();

        // Sin SO_REUSEPORT, un segundo listener activo en el mismo puerto falla
        let mut config = test_config(&root);
        config.port = port;
        assert!(matches!(
            Server::bind(config),
            Err(ServerError::Socket { stage: "bind", .. })
        ));
    }

    #[test]
    fn test_run_serves_and_stops_on_signal() {
        let root = TempRoot::new("tcp_run");
        root.write("index.html", b"hello world!");

        let server = Server::bind(test_config(&root)).unwrap();
        let addr = server.local_addr().unwrap();
        let signal = server.shutdown_signal();
        let handle = thread::spawn(move || server.run());

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET /index.html HTTP/1.1\r\n\r\n").unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        assert!(buf.ends_with(b"\r\n\r\nhello world!"));

        signal.trigger();
        let snapshot = handle.join().unwrap().unwrap();
        assert_eq!(snapshot.accepted, 1);
        assert_eq!(snapshot.responses.get(&200), Some(&1));

        // El socket de escucha quedó cerrado
        assert!(TcpStream::connect(addr).is_err());
    }
}

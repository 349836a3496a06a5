//! # Estadísticas de Conexiones
//! src/metrics/collector.rs
//!
//! Cuenta qué pasó con cada conexión: respuestas por código, conexiones
//! abortadas por tipo de error y bytes enviados. El servidor registra un
//! snapshot en JSON al apagarse.

use crate::http::StatusCode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Collector de estadísticas thread-safe
#[derive(Clone)]
pub struct ConnectionStats {
    inner: Arc<Mutex<StatsData>>,
    start_time: Instant,
}

/// Datos internos
#[derive(Default)]
struct StatsData {
    /// Conexiones aceptadas por el listener
    accepted: u64,

    /// Respuestas completas por código de estado
    responses: BTreeMap<u16, u64>,

    /// Conexiones abortadas por tipo de error
    aborted: BTreeMap<&'static str, u64>,

    /// Clientes que cerraron sin mandar request
    peer_closed: u64,

    /// Bytes de body enviados
    body_bytes: u64,

    /// Suma de latencias de conexiones terminadas (microsegundos)
    total_latency_us: u128,

    /// Conexiones terminadas (con o sin respuesta)
    finished: u64,
}

/// Foto de las estadísticas en un momento dado
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub accepted: u64,
    pub responses: BTreeMap<u16, u64>,
    pub aborted: BTreeMap<String, u64>,
    pub peer_closed: u64,
    pub body_bytes: u64,
    pub avg_latency_ms: f64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatsData::default())),
            start_time: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_accepted(&self) {
        self.lock().accepted += 1;
    }

    /// Registra una respuesta enviada completa
    pub fn record_response(&self, status: StatusCode, body_bytes: usize, latency: Duration) {
        let mut data = self.lock();
        *data.responses.entry(status.as_u16()).or_insert(0) += 1;
        data.body_bytes += body_bytes as u64;
        Self::record_finished(&mut data, latency);
    }

    /// Registra una conexión abortada por un error
    pub fn record_aborted(&self, kind: &'static str, latency: Duration) {
        let mut data = self.lock();
        *data.aborted.entry(kind).or_insert(0) += 1;
        Self::record_finished(&mut data, latency);
    }

    /// Registra un cliente que cerró sin mandar nada
    pub fn record_peer_closed(&self, latency: Duration) {
        let mut data = self.lock();
        data.peer_closed += 1;
        Self::record_finished(&mut data, latency);
    }

    fn record_finished(data: &mut StatsData, latency: Duration) {
        data.finished += 1;
        data.total_latency_us += latency.as_micros();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let data = self.lock();

        let avg_latency_ms = if data.finished == 0 {
            0.0
        } else {
            (data.total_latency_us as f64 / data.finished as f64) / 1000.0
        };

        StatsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            accepted: data.accepted,
            responses: data.responses.clone(),
            aborted: data
                .aborted
                .iter()
                .map(|(kind, count)| (kind.to_string(), *count))
                .collect(),
            peer_closed: data.peer_closed,
            body_bytes: data.body_bytes,
            avg_latency_ms,
        }
    }

    /// Snapshot en formato JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

impl Default for ConnectionStats {
    fn default() -> Self {
        Self::new()
    }
}

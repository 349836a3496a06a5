//! # Señal de Apagado
//! src/server/shutdown.rs
//!
//! Token de cancelación compartido entre el handler de SIGINT/SIGTERM, el
//! accept loop y los tests. Una vez disparado no se puede rearmar.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Token de apagado clonable
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispara el apagado y despierta a quien esté esperando
    pub fn trigger(&self) {
        let (flag, condvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        condvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Espera hasta que se dispare el apagado o pase `timeout`
    ///
    /// Retorna `true` si el apagado está disparado.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, condvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = condvar
            .wait_timeout_while(guard, timeout, |triggered| !*triggered)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

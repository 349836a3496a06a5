//! # Cola FIFO Acotada
//! src/workers/queue.rs
//!
//! Cola thread-safe entre el listener (productor) y los workers
//! (consumidores). Cuando está llena, `push` bloquea: eso frena al accept
//! loop en vez de dejar crecer la cola sin límite.
//!
//! Al cerrarla, `push` deja de aceptar items y `pop` sigue entregando los
//! pendientes hasta vaciarla; recién ahí devuelve `None`.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// La cola ya fue cerrada; se devuelve el item que no se pudo encolar
#[derive(Error)]
#[error("work queue is closed")]
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueClosed(..)")
    }
}

/// Estado protegido por el mutex
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,

    /// Avisa a los workers que hay items (o que se cerró la cola)
    not_empty: Condvar,

    /// Avisa al productor que se liberó espacio (o que se cerró la cola)
    not_full: Condvar,

    capacity: usize,
}

/// Cola FIFO acotada y bloqueante
pub struct WorkQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> WorkQueue<T> {
    /// Crea una cola con capacidad máxima (mínimo 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    items: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                capacity,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un item al final
    ///
    /// Bloquea mientras la cola esté llena. Si la cola está cerrada (antes o
    /// durante la espera) devuelve el item dentro de `QueueClosed`.
    pub fn push(&self, item: T) -> Result<(), QueueClosed<T>> {
        let mut state = self.lock();

        while !state.closed && state.items.len() >= self.shared.capacity {
            state = self
                .shared
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.closed {
            return Err(QueueClosed(item));
        }

        state.items.push_back(item);

        // Notificar a un worker esperando
        self.shared.not_empty.notify_one();

        Ok(())
    }

    /// Desencola el item más antiguo
    ///
    /// Bloquea mientras la cola esté vacía. Devuelve `None` sólo cuando la
    /// cola está cerrada y ya no quedan items.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();

        loop {
            if let Some(item) = state.items.pop_front() {
                self.shared.not_full.notify_one();
                return Some(item);
            }

            if state.closed {
                return None;
            }

            state = self
                .shared
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cierra la cola y despierta a todos los que estén esperando
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        drop(state);

        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

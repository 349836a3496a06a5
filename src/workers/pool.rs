//! # Pool Fijo de Workers
//! src/workers/pool.rs
//!
//! Un número fijo de threads de larga vida consumen la misma cola acotada.
//! Cada item lo procesa exactamente un worker, de forma sincrónica, y el
//! worker vuelve a la cola.
//!
//! El apagado es explícito: se cierra la cola, los workers terminan los
//! items pendientes y se hace `join` de todos antes de retornar.

use super::queue::{QueueClosed, WorkQueue};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Un thread del pool
struct Worker {
    id: usize,
    handle: JoinHandle<()>,
}

/// Pool fijo de workers sobre una cola FIFO acotada
pub struct WorkerPool<T: Send + 'static> {
    queue: WorkQueue<T>,
    workers: Vec<Worker>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Inicia `worker_count` workers que ejecutan `handler` por cada item
    ///
    /// # Errores
    ///
    /// Si el sistema no permite crear algún thread, se detienen los que ya
    /// arrancaron y se retorna el error.
    pub fn start<F>(worker_count: usize, queue_capacity: usize, handler: F) -> io::Result<Self>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let queue = WorkQueue::new(queue_capacity);
        let handler = Arc::new(handler);
        let mut pool = Self {
            queue,
            workers: Vec::with_capacity(worker_count),
        };

        for id in 0..worker_count {
            let queue = pool.queue.clone();
            let handler = Arc::clone(&handler);

            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || Self::worker_loop(id, queue, handler));

            match spawned {
                Ok(handle) => pool.workers.push(Worker { id, handle }),
                Err(e) => {
                    error!(worker = id, error = %e, "No se pudo crear el worker");
                    pool.shutdown();
                    return Err(e);
                }
            }
        }

        info!(workers = worker_count, queue_capacity = pool.queue.capacity(), "Pool de workers iniciado");

        Ok(pool)
    }

    /// Loop principal del worker
    fn worker_loop<F>(id: usize, queue: WorkQueue<T>, handler: Arc<F>)
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        debug!(worker = id, "Worker iniciado");

        while let Some(item) = queue.pop() {
            // Un panic en el handler no debe matar al worker
            if panic::catch_unwind(AssertUnwindSafe(|| handler(item))).is_err() {
                error!(worker = id, "El handler hizo panic; el worker sigue atendiendo");
            }
        }

        debug!(worker = id, "Worker detenido");
    }

    /// Encola un item; bloquea mientras la cola esté llena
    pub fn submit(&self, item: T) -> Result<(), QueueClosed<T>> {
        self.queue.push(item)
    }

    /// Items esperando un worker
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Cierra la cola, deja terminar los items pendientes y hace join de todos
    ///
    /// Llamarlo más de una vez no tiene efecto.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            self.queue.close();
            return;
        }

        info!(pending = self.queue.len(), "Deteniendo pool de workers");
        self.queue.close();

        for worker in self.workers.drain(..) {
            if worker.handle.join().is_err() {
                error!(worker = worker.id, "El worker terminó con panic");
            }
        }

        info!("Pool de workers detenido");
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};
    use std::time::Duration;

    #[test]
    fn test_processes_every_item_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pool = {
            let seen = Arc::clone(&seen);
            WorkerPool::start(4, 8, move |item: usize| {
                seen.lock().unwrap().push(item);
            })
            .unwrap()
        };
        assert_eq!(pool.worker_count(), 4);

        for i in 0..100 {
            pool.submit(i).unwrap();
        }
        pool.shutdown();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_worker_preserves_fifo() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pool = {
            let seen = Arc::clone(&seen);
            WorkerPool::start(1, 4, move |item: u32| seen.lock().unwrap().push(item)).unwrap()
        };

        for i in 0..20 {
            pool.submit(i).unwrap();
        }
        pool.shutdown();

        assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_items_run_on_several_workers() {
        let names = Arc::new(Mutex::new(HashSet::new()));
        let mut pool = {
            let names = Arc::clone(&names);
            WorkerPool::start(3, 16, move |_: ()| {
                let name = thread::current().name().unwrap_or("").to_string();
                names.lock().unwrap().insert(name);
                thread::sleep(Duration::from_millis(30));
            })
            .unwrap()
        };

        for _ in 0..9 {
            pool.submit(()).unwrap();
        }
        pool.shutdown();

        let names = names.lock().unwrap();
        assert!(names.len() > 1, "expected several workers, got {:?}", names);
        assert!(names.iter().all(|n| n.starts_with("worker-")));
    }

    #[test]
    fn test_panic_does_not_kill_worker() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut pool = {
            let done = Arc::clone(&done);
            WorkerPool::start(1, 4, move |item: u32| {
                if item == 0 {
                    panic!("boom");
                }
                done.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
        };

        pool.submit(0).unwrap();
        pool.submit(1).unwrap();
        pool.submit(2).unwrap();
        pool.shutdown();

        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_shutdown_drains_pending_items() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut pool = {
            let done = Arc::clone(&done);
            WorkerPool::start(2, 32, move |_: u8| {
                thread::sleep(Duration::from_millis(10));
                done.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
        };

        for _ in 0..20 {
            pool.submit(0).unwrap();
        }
        pool.shutdown();

        assert_eq!(done.load(Ordering::SeqCst), 20);
        assert_eq!(pool.queued(), 0);
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let mut pool = WorkerPool::start(1, 1, |_: u8| {}).unwrap();
        pool.shutdown();
        pool.shutdown();

        assert!(pool.submit(1).is_err());
    }

    #[test]
    fn test_submit_applies_backpressure() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let mut pool = WorkerPool::start(1, 1, move |_: u8| {
            let _ = release_rx.lock().unwrap().recv();
        })
        .unwrap();

        // Uno en el worker, uno en la cola
        pool.submit(0).unwrap();
        thread::sleep(Duration::from_millis(50));
        pool.submit(1).unwrap();

        let (done_tx, done_rx) = mpsc::channel();

        thread::scope(|scope| {
            scope.spawn(|| {
                pool.submit(2).unwrap();
                done_tx.send(()).unwrap();
            });

            // La tercera entrega queda bloqueada hasta liberar al worker
            assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
            release_tx.send(()).unwrap();
            done_rx.recv_timeout(Duration::from_secs(5)).expect("submit should unblock");
        });

        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();
        pool.shutdown();
    }
}

//! # Workers
//!
//! Desacopla la aceptación de conexiones de su procesamiento:
//! - `queue`: cola FIFO acotada con back-pressure y cierre
//! - `pool`: número fijo de threads que consumen la cola

pub mod pool;
pub mod queue;

pub use pool::WorkerPool;
pub use queue::{QueueClosed, WorkQueue};

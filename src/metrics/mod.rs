//! # Módulo de Métricas
//!
//! Contadores por resultado de cada conexión, para el log de apagado.

pub mod collector;

pub use collector::{ConnectionStats, StatsSnapshot};

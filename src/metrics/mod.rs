//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Este módulo implementa la recolección y agregación de métricas del servidor:
//! - Contadores de requests por código y por ruta
//! - Latencias de servicio (p50, p95, p99)
//! - Tiempo de espera en la cola de planificación
//! - Workers ocupados y handlers fallidos

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};

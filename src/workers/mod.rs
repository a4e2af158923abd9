//! # Pool de Workers
//! src/workers/mod.rs
//!
//! Un número fijo de threads creados al arrancar. Cada worker repite:
//! sacar una conexión de la cola, atenderla, cerrarla.
//!
//! El pool no sabe nada de HTTP: depende solo de dos traits,
//! `Connection` (algo que se puede cerrar) y `RequestHandler` (algo que
//! atiende una conexión).

pub mod pool;

pub use pool::{Connection, RequestHandler, WorkerPool};

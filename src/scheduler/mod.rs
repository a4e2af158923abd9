//! # Planificación de Conexiones
//! src/scheduler/mod.rs
//!
//! Núcleo de admisión y despacho:
//!
//! ```text
//! acceptor ──admit──▶ [ SchedulingQueue ] ──remove──▶ worker 0..N
//!                      (FIFO | SFF | RANDOM)
//! ```
//!
//! - `policy`: elige las reglas de inserción y extracción
//! - `queue`: buffer circular acotado con backpressure

pub mod policy;
pub mod queue;

pub use policy::{Insertion, Removal, SchedulingPolicy};
pub use queue::{QueueEntry, QueueStats, SchedulingQueue};

//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! - `tcp`: el thread acceptor. Acepta, lee y valida cada request y lo
//!   admite en la cola de planificación.
//! - `static_files`: resolución de URIs dentro del document root y el
//!   handler que ejecutan los workers para servir el archivo.

pub mod static_files;
pub mod tcp;

pub use static_files::{PendingRequest, Rejection, StaticFile, StaticFileHandler};
pub use tcp::Server;

//! # Tipos de Error
//! src/error.rs
//!
//! Errores del servidor agrupados por capa:
//!
//! - `ConfigError`: configuración inválida, se detecta al arrancar antes de
//!   crear cualquier thread.
//! - `HandlerError`: fallos al atender una conexión concreta. Nunca salen
//!   del worker que la atiende.
//! - `ServerError`: fallos fatales del proceso (bind, logging, config).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::http::StatusCode;
use crate::logging::LogError;

/// Configuración inválida (falla rápido, antes de lanzar threads)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be >= 1")]
    ZeroWorkers,

    #[error("queue capacity must be >= 1")]
    ZeroCapacity,

    #[error("unknown scheduling policy: {0} (expected FIFO, SFF or RANDOM)")]
    UnknownPolicy(String),

    #[error("document root {} is not a directory", .0.display())]
    InvalidRoot(PathBuf),
}

/// Error al atender una conexión ya encolada
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("I/O error while serving: {0}")]
    Io(#[from] io::Error),

    /// El archivo cambió entre la admisión y el servicio; ya se respondió
    /// al cliente con `status`
    #[error("file {} changed after admission ({status}): {reason}", .path.display())]
    Vanished {
        path: PathBuf,
        status: StatusCode,
        reason: String,
    },
}

/// Errores fatales del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LogError),
}

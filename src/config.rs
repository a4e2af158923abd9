//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y variables de
//! entorno (clap derive).
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./sched_server --root ./public --port 10000 \
//!   --threads 8 \
//!   --buffers 32 \
//!   --schedalg SFF
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! PORT=8080 DOC_ROOT=./public SCHEDALG=random ./sched_server
//! ```

use crate::error::ConfigError;
use crate::logging::{LogConfig, LogFormat};
use crate::scheduler::SchedulingPolicy;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "sched_server")]
#[command(about = "Servidor HTTP/1.0 de archivos estáticos con pool de workers y cola planificada")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "10000", env = "PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HOST")]
    pub host: String,

    /// Directorio raíz de los archivos servidos
    #[arg(short = 'd', long = "root", default_value = ".", env = "DOC_ROOT")]
    pub root: PathBuf,

    // === Workers y cola ===

    /// Número de workers
    #[arg(short = 't', long, default_value = "4", env = "THREADS")]
    pub threads: usize,

    /// Capacidad de la cola de conexiones pendientes
    #[arg(short = 'b', long, default_value = "16", env = "BUFFERS")]
    pub buffers: usize,

    /// Política de planificación: FIFO, SFF o RANDOM
    #[arg(short = 's', long, default_value = "FIFO", env = "SCHEDALG")]
    pub schedalg: SchedulingPolicy,

    // === Timeouts ===

    /// Espera máxima para entrar a la cola llena (0 = bloquear sin límite)
    #[arg(long = "admit-timeout-ms", default_value = "0", env = "ADMIT_TIMEOUT_MS")]
    pub admit_timeout_ms: u64,

    /// Valor sugerido en `Retry-After` cuando se responde 503
    #[arg(long = "retry-after-ms", default_value = "5000", env = "RETRY_AFTER_MS")]
    pub retry_after_ms: u64,

    /// Timeout de lectura del request (0 = sin timeout)
    #[arg(long = "read-timeout-ms", default_value = "10000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    // === Logging ===

    /// Filtro de logging (ej: "info", "sched_server=debug")
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Formato de los logs
    #[arg(long = "log-format", value_enum, default_value = "pretty", env = "LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Config {
    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use sched_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:10000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Se llama antes de crear cualquier thread.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.buffers == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !self.root.is_dir() {
            return Err(ConfigError::InvalidRoot(self.root.clone()));
        }

        Ok(())
    }

    pub fn admit_timeout(&self) -> Option<Duration> {
        (self.admit_timeout_ms > 0).then(|| Duration::from_millis(self.admit_timeout_ms))
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// `Retry-After` en segundos (redondeado hacia arriba, mínimo 1)
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after_ms.div_ceil(1000).max(1)
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            format: self.log_format,
            level: self.log_level.clone(),
        }
    }

    /// Deja en el log un resumen de la configuración efectiva
    pub fn log_summary(&self) {
        info!(
            address = %self.address(),
            root = %self.root.display(),
            threads = self.threads,
            buffers = self.buffers,
            policy = %self.schedalg,
            admit_timeout_ms = self.admit_timeout_ms,
            read_timeout_ms = self.read_timeout_ms,
            "configuration"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto (los mismos valores que el CLI)
    fn default() -> Self {
        Self {
            port: 10000,
            host: "127.0.0.1".to_string(),
            root: PathBuf::from("."),
            threads: 4,
            buffers: 16,
            schedalg: SchedulingPolicy::Fifo,
            admit_timeout_ms: 0,
            retry_after_ms: 5_000,
            read_timeout_ms: 10_000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

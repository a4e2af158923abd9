//! # Pool de Workers
//! src/workers/pool.rs
//!
//! N threads de larga vida. Cada uno repite:
//!
//! 1. `queue.remove()` (bloquea si la cola está vacía)
//! 2. atiende la conexión con el `RequestHandler`
//! 3. cierra la conexión, pase lo que pase en el paso 2
//!
//! Los workers no se comunican entre sí: toda la coordinación pasa por la
//! cola. Un handler que falla o hace panic solo afecta a su request.

use crate::error::HandlerError;
use crate::metrics::MetricsCollector;
use crate::scheduler::{QueueEntry, SchedulingQueue};
use std::any::Any;
use std::io;
use std::net::{Shutdown, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Conexión que el worker debe cerrar al terminar
pub trait Connection: Send + 'static {
    fn close(self) -> io::Result<()>;
}

impl Connection for TcpStream {
    fn close(self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // El cliente ya cerró: no es un error para nosotros
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

/// Atiende una conexión extraída de la cola
///
/// Los errores ya fueron respondidos al cliente (o no se pudo); el worker
/// solo los registra.
pub trait RequestHandler<C>: Send + Sync + 'static {
    fn handle(&self, connection: &mut C) -> Result<(), HandlerError>;
}

impl<C, F> RequestHandler<C> for F
where
    F: Fn(&mut C) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn handle(&self, connection: &mut C) -> Result<(), HandlerError> {
        self(connection)
    }
}

/// Pool fijo de workers
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Lanza `workers` threads que consumen de `queue`
    ///
    /// Los threads viven lo que vive el proceso.
    pub fn spawn<C, H>(
        workers: usize,
        queue: Arc<SchedulingQueue<C>>,
        handler: Arc<H>,
        metrics: Arc<MetricsCollector>,
    ) -> io::Result<Self>
    where
        C: Connection,
        H: RequestHandler<C>,
    {
        if workers == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "worker count must be >= 1"));
        }

        let mut handles = Vec::with_capacity(workers);

        for i in 0..workers {
            let queue = Arc::clone(&queue);
            let handler = Arc::clone(&handler);
            let metrics = Arc::clone(&metrics);
            let name = format!("worker-{}", i);

            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || Self::worker_loop(name, queue, handler, metrics))?;
            handles.push(handle);
        }

        info!(workers, policy = %queue.policy(), capacity = queue.capacity(), "pool de workers iniciado");

        Ok(Self { handles })
    }

    /// Número de workers del pool
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Loop principal del worker
    fn worker_loop<C, H>(
        name: String,
        queue: Arc<SchedulingQueue<C>>,
        handler: Arc<H>,
        metrics: Arc<MetricsCollector>,
    ) where
        C: Connection,
        H: RequestHandler<C>,
    {
        debug!(worker = %name, "worker started");

        loop {
            let QueueEntry { mut connection, size } = queue.remove();
            metrics.worker_busy();
            debug!(worker = %name, size, "worker picked up connection");

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&mut connection)));

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    metrics.record_handler_fault();
                    warn!(worker = %name, size, error = %e, "request failed");
                }
                Err(payload) => {
                    metrics.record_handler_fault();
                    error!(worker = %name, size, panic = panic_message(&*payload), "handler panicked");
                }
            }

            if let Err(e) = connection.close() {
                debug!(worker = %name, error = %e, "error closing connection");
            }

            metrics.worker_idle();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

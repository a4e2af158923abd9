//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Un único thread acceptor y un pool fijo de workers, comunicados por la
//! cola de planificación.
//!
//! El acceptor hace el intake de cada conexión: lee el request, lo valida y
//! obtiene el tamaño del archivo. Los errores se responden ahí mismo y la
//! conexión nunca entra en la cola; solo se admiten requests que se pueden
//! servir, con el tamaño del archivo como clave de SFF.

use crate::config::Config;
use crate::error::ServerError;
use crate::http::{ParseError, Request, Response, StatusCode};
use crate::metrics::MetricsCollector;
use crate::scheduler::{QueueEntry, SchedulingQueue};
use crate::server::static_files::{PendingRequest, Rejection, StaticFile, StaticFileHandler};
use crate::workers::{Connection, WorkerPool};
use std::io::{self, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Ruta atendida por el acceptor con las métricas en JSON
const METRICS_PATH: &str = "/metrics";

/// Servidor HTTP/1.0 de archivos estáticos
pub struct Server {
    config: Config,
    queue: Arc<SchedulingQueue<PendingRequest>>,
    metrics: Arc<MetricsCollector>,
    handler: Arc<StaticFileHandler>,
    listener: Option<TcpListener>,
}

impl Server {
    /// Valida la configuración y crea la cola (todavía sin threads ni socket)
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config.validate()?;

        let queue = Arc::new(SchedulingQueue::new(config.buffers, config.schedalg)?);
        let metrics = Arc::new(MetricsCollector::new());
        let handler = Arc::new(StaticFileHandler::new(Arc::clone(&metrics)));

        Ok(Self {
            config,
            queue,
            metrics,
            handler,
            listener: None,
        })
    }

    /// Abre el socket de escucha (si ya estaba abierto, no hace nada)
    ///
    /// Con puerto 0 el SO elige uno libre; la dirección real se devuelve.
    pub fn bind(&mut self) -> io::Result<SocketAddr> {
        if let Some(listener) = &self.listener {
            return listener.local_addr();
        }

        let listener = TcpListener::bind(self.config.address())?;
        let addr = listener.local_addr()?;
        info!(%addr, "listening");

        self.listener = Some(listener);
        Ok(addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn queue(&self) -> &Arc<SchedulingQueue<PendingRequest>> {
        &self.queue
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Lanza el pool y entra al loop de `accept` (no retorna en operación normal)
    pub fn run(&mut self) -> Result<(), ServerError> {
        self.bind()?;

        let pool = WorkerPool::spawn(
            self.config.threads,
            Arc::clone(&self.queue),
            Arc::clone(&self.handler),
            Arc::clone(&self.metrics),
        )?;
        info!(
            workers = pool.size(),
            buffers = self.config.buffers,
            policy = %self.config.schedalg,
            root = %self.config.root.display(),
            "server ready"
        );

        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "listener not bound"))?;

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => self.intake(stream),
                Err(e) => warn!(error = %e, "accept failed"),
            }
        }

        Ok(())
    }

    /// Lee, valida y admite (o responde) una conexión recién aceptada
    fn intake(&self, stream: TcpStream) {
        let accepted_at = Instant::now();
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        if let Err(e) = stream.set_read_timeout(self.config.read_timeout()) {
            warn!(%peer, error = %e, "could not set read timeout");
        }

        let head = {
            let mut reader = BufReader::new(&stream);
            Request::read_head(&mut reader)
        };

        let head = match head {
            Ok(head) if head.is_empty() => {
                debug!(%peer, "connection closed before sending a request");
                Self::close(stream, &peer);
                return;
            }
            Ok(head) => head,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                let rejection = Rejection::new(StatusCode::BadRequest, "request head", "request too large");
                self.reject(stream, &peer, "-", rejection, accepted_at);
                return;
            }
            Err(e) => {
                debug!(%peer, error = %e, "failed to read request");
                Self::close(stream, &peer);
                return;
            }
        };

        let request = match Request::parse(&head) {
            Ok(request) => request,
            Err(ParseError::UnsupportedMethod(method)) => {
                let rejection = Rejection::new(
                    StatusCode::NotImplemented,
                    &method,
                    "server does not implement this method",
                );
                self.reject(stream, &peer, "-", rejection, accepted_at);
                return;
            }
            Err(e) => {
                let rejection = Rejection::new(StatusCode::BadRequest, &e.to_string(), "malformed request");
                self.reject(stream, &peer, "-", rejection, accepted_at);
                return;
            }
        };

        let uri = request.path().to_string();
        debug!(
            %peer,
            method = request.method().as_str(),
            %uri,
            query = request.query().unwrap_or(""),
            version = request.version(),
            user_agent = request.header("user-agent").unwrap_or("-"),
            "request received"
        );

        if !request.method().is_supported() {
            let rejection = Rejection::new(
                StatusCode::NotImplemented,
                request.method().as_str(),
                "server does not implement this method",
            );
            self.reject(stream, &peer, &uri, rejection, accepted_at);
            return;
        }

        if uri == METRICS_PATH {
            self.serve_metrics(stream, &peer, accepted_at);
            return;
        }

        let file = match StaticFile::open(&self.config.root, &uri) {
            Ok(file) => file,
            Err(rejection) => {
                self.reject(stream, &peer, &uri, rejection, accepted_at);
                return;
            }
        };

        let size = file.size;
        let pending = PendingRequest {
            stream,
            peer,
            uri,
            file,
            accepted_at,
            admitted_at: Instant::now(),
        };
        self.admit(QueueEntry::new(pending, size));
    }

    /// Entrega la entrada a la cola según la política de admisión configurada
    fn admit(&self, entry: QueueEntry<PendingRequest>) {
        let Some(timeout) = self.config.admit_timeout() else {
            self.queue.admit(entry);
            return;
        };

        if let Err(entry) = self.queue.admit_timeout(entry, timeout) {
            let pending = entry.connection;
            warn!(peer = %pending.peer, uri = %pending.uri, "queue full, rejecting");

            let response = Response::error(
                StatusCode::ServiceUnavailable,
                &pending.uri,
                "server is overloaded, try again later",
            )
            .with_header("Retry-After", &self.config.retry_after_secs().to_string());

            self.respond(pending.stream, &pending.peer, response, pending.accepted_at);
        }
    }

    fn serve_metrics(&self, mut stream: TcpStream, peer: &str, accepted_at: Instant) {
        let body = self.metrics.to_json(&self.queue.stats());
        let response = Response::json(&body.to_string());

        if let Err(e) = stream.write_all(&response.to_bytes()).and_then(|_| stream.flush()) {
            debug!(%peer, error = %e, "failed to write metrics");
        }
        self.metrics
            .record_request(METRICS_PATH, StatusCode::Ok.as_u16(), accepted_at.elapsed());
        Self::close(stream, peer);
    }

    fn reject(&self, stream: TcpStream, peer: &str, uri: &str, rejection: Rejection, accepted_at: Instant) {
        info!(%peer, %uri, status = rejection.status.as_u16(), cause = %rejection.cause, "rejected");
        self.respond(stream, peer, rejection.response(), accepted_at);
    }

    /// Escribe una respuesta generada por el acceptor y cierra la conexión
    fn respond(&self, mut stream: TcpStream, peer: &str, response: Response, accepted_at: Instant) {
        if let Err(e) = stream.write_all(&response.to_bytes()).and_then(|_| stream.flush()) {
            debug!(%peer, error = %e, "failed to write response");
        }
        self.metrics
            .record_rejection(response.status().as_u16(), accepted_at.elapsed());
        Self::close(stream, peer);
    }

    fn close(stream: TcpStream, peer: &str) {
        if let Err(e) = stream.close() {
            debug!(%peer, error = %e, "error closing connection");
        }
    }
}

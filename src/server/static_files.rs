//! # Archivos Estáticos
//! src/server/static_files.rs
//!
//! Dos mitades:
//!
//! - **Intake** (thread acceptor): `StaticFile::open` resuelve la URI dentro
//!   del document root y obtiene el tamaño con `metadata()`. Si falla, el
//!   acceptor responde con la página de error y la conexión nunca entra en
//!   la cola.
//! - **Servicio** (workers): `StaticFileHandler` mapea el archivo en memoria
//!   y lo escribe en el socket.

use crate::error::HandlerError;
use crate::http::response::SERVER_NAME;
use crate::http::{Response, StatusCode};
use crate::metrics::MetricsCollector;
use crate::workers::{Connection, RequestHandler};
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::net::TcpStream;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Archivo resuelto y validado, listo para encolarse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    pub path: PathBuf,
    /// Tamaño visto al admitir (clave de SFF)
    pub size: u64,
    pub content_type: &'static str,
}

/// Motivo por el que el acceptor no encola una conexión
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    /// Lo que se pidió (la URI o el método)
    pub cause: String,
    pub detail: &'static str,
}

impl Rejection {
    pub fn new(status: StatusCode, cause: &str, detail: &'static str) -> Self {
        Self {
            status,
            cause: cause.to_string(),
            detail,
        }
    }

    /// Página de error para el cliente
    pub fn response(&self) -> Response {
        Response::error(self.status, &self.cause, self.detail)
    }
}

/// Traduce la URI a una ruta dentro de `root`
///
/// Una URI terminada en `/` sirve el `index.html` de ese directorio.
pub fn resolve_uri(root: &Path, uri: &str) -> Result<PathBuf, Rejection> {
    let relative = Path::new(uri.trim_start_matches('/'));

    // Solo componentes normales: nada de "..", raíces ni prefijos
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Rejection::new(
            StatusCode::Forbidden,
            uri,
            "directory traversal attempt blocked",
        ));
    }

    let mut path = root.join(relative);
    if uri.ends_with('/') {
        path.push("index.html");
    }

    Ok(path)
}

/// Contenido dinámico (CGI): no soportado
fn is_dynamic(uri: &str) -> bool {
    uri.contains("cgi")
}

/// Tipo MIME según la extensión
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("gif") => "image/gif",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        _ => "text/plain",
    }
}

#[cfg(unix)]
fn owner_can_read(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o400 != 0
}

#[cfg(not(unix))]
fn owner_can_read(_metadata: &fs::Metadata) -> bool {
    true
}

impl StaticFile {
    /// Resuelve y valida `uri` dentro de `root`
    ///
    /// Orden de las comprobaciones: traversal (403), existencia (404),
    /// contenido dinámico (501), archivo regular y legible (403).
    pub fn open(root: &Path, uri: &str) -> Result<Self, Rejection> {
        let path = resolve_uri(root, uri)?;

        let metadata = fs::metadata(&path)
            .map_err(|_| Rejection::new(StatusCode::NotFound, uri, "file not found on server"))?;

        if is_dynamic(uri) {
            return Err(Rejection::new(
                StatusCode::NotImplemented,
                uri,
                "dynamic content not supported",
            ));
        }

        if !metadata.is_file() || !owner_can_read(&metadata) {
            return Err(Rejection::new(StatusCode::Forbidden, uri, "cannot read this file"));
        }

        Ok(Self {
            content_type: content_type(&path),
            size: metadata.len(),
            path,
        })
    }
}

/// Escribe el archivo completo como respuesta 200
///
/// Si el archivo desapareció desde la admisión se responde con una página de
/// error y se devuelve `HandlerError::Vanished`.
pub fn serve_file<W: Write>(out: &mut W, file: &StaticFile, uri: &str) -> Result<(), HandlerError> {
    let handle = match File::open(&file.path) {
        Ok(handle) => handle,
        Err(e) => {
            let (status, detail) = match e.kind() {
                io::ErrorKind::NotFound => (StatusCode::NotFound, "file not found on server"),
                _ => (StatusCode::Forbidden, "cannot read this file"),
            };
            out.write_all(&Response::error(status, uri, detail).to_bytes())?;
            out.flush()?;
            return Err(HandlerError::Vanished {
                path: file.path.clone(),
                status,
                reason: e.to_string(),
            });
        }
    };

    // Se sirve el tamaño actual: si cambió desde la admisión solo afecta al orden
    let size = handle.metadata()?.len();
    if size != file.size {
        debug!(path = %file.path.display(), admitted = file.size, now = size, "file size changed while queued");
    }

    let head = Response::new(StatusCode::Ok)
        .with_header("Server", SERVER_NAME)
        .with_header("Content-Length", &size.to_string())
        .with_header("Content-Type", file.content_type)
        .head_bytes();
    out.write_all(&head)?;

    if size > 0 {
        // SAFETY: el mapa es de solo lectura y vive solo durante esta escritura;
        // el document root no se modifica mientras se sirve.
        let map = unsafe { Mmap::map(&handle)? };
        out.write_all(&map)?;
    }

    out.flush()?;
    Ok(())
}

/// Conexión aceptada, con su archivo ya resuelto, esperando un worker
#[derive(Debug)]
pub struct PendingRequest {
    pub stream: TcpStream,
    pub peer: String,
    pub uri: String,
    pub file: StaticFile,
    /// Momento del `accept` (latencia total)
    pub accepted_at: Instant,
    /// Momento en que entró a la cola (tiempo de espera)
    pub admitted_at: Instant,
}

impl Connection for PendingRequest {
    fn close(self) -> io::Result<()> {
        self.stream.close()
    }
}

/// Handler de los workers: sirve el archivo y registra métricas
pub struct StaticFileHandler {
    metrics: Arc<MetricsCollector>,
}

impl StaticFileHandler {
    pub fn new(metrics: Arc<MetricsCollector>) -> Self {
        Self { metrics }
    }
}

impl RequestHandler<PendingRequest> for StaticFileHandler {
    fn handle(&self, request: &mut PendingRequest) -> Result<(), HandlerError> {
        self.metrics.record_queue_wait(request.admitted_at.elapsed());

        let result = serve_file(&mut request.stream, &request.file, &request.uri);

        let status = match &result {
            Ok(()) => StatusCode::Ok,
            Err(HandlerError::Vanished { status, .. }) => *status,
            Err(HandlerError::Io(_)) => StatusCode::InternalServerError,
        };
        let latency = request.accepted_at.elapsed();
        self.metrics.record_request(&request.uri, status.as_u16(), latency);

        info!(
            peer = %request.peer,
            uri = %request.uri,
            size = request.file.size,
            status = status.as_u16(),
            latency_ms = latency.as_secs_f64() * 1000.0,
            "served"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn docroot() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(dir.path().join("notes.txt"), "plain notes").unwrap();
        fs::write(dir.path().join("empty.txt"), "").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("index.html"), "docs").unwrap();
        fs::create_dir(dir.path().join("cgi-bin")).unwrap();
        fs::write(dir.path().join("cgi-bin").join("script.sh"), "#!/bin/sh").unwrap();
        dir
    }

    // ==================== Resolución ====================

    #[test]
    fn test_resolve_plain_file() {
        let root = Path::new("/srv/www");
        assert_eq!(resolve_uri(root, "/a/b.html").unwrap(), PathBuf::from("/srv/www/a/b.html"));
    }

    #[test]
    fn test_resolve_directory_index() {
        let root = Path::new("/srv/www");
        assert_eq!(resolve_uri(root, "/").unwrap(), PathBuf::from("/srv/www/index.html"));
        assert_eq!(resolve_uri(root, "/docs/").unwrap(), PathBuf::from("/srv/www/docs/index.html"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv/www");
        for uri in ["/../etc/passwd", "/docs/../../secret", "/a/.."] {
            let rejection = resolve_uri(root, uri).unwrap_err();
            assert_eq!(rejection.status, StatusCode::Forbidden);
            assert_eq!(rejection.detail, "directory traversal attempt blocked");
        }
    }

    #[test]
    fn test_resolve_allows_dots_inside_names() {
        let root = Path::new("/srv/www");
        assert!(resolve_uri(root, "/release..notes.txt").is_ok());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type(Path::new("a.html")), "text/html");
        assert_eq!(content_type(Path::new("a.HTM")), "text/html");
        assert_eq!(content_type(Path::new("a.gif")), "image/gif");
        assert_eq!(content_type(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type(Path::new("a.png")), "image/png");
        assert_eq!(content_type(Path::new("a.tar.gz")), "text/plain");
        assert_eq!(content_type(Path::new("README")), "text/plain");
    }

    // ==================== Intake ====================

    #[test]
    fn test_open_existing_file() {
        let dir = docroot();
        let file = StaticFile::open(dir.path(), "/notes.txt").unwrap();

        assert_eq!(file.size, 11);
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(file.path, dir.path().join("notes.txt"));
    }

    #[test]
    fn test_open_index_of_directory() {
        let dir = docroot();
        let file = StaticFile::open(dir.path(), "/docs/").unwrap();
        assert_eq!(file.size, 4);
        assert_eq!(file.content_type, "text/html");
    }

    #[test]
    fn test_open_missing_is_404() {
        let dir = docroot();
        let rejection = StaticFile::open(dir.path(), "/nope.html").unwrap_err();
        assert_eq!(rejection.status, StatusCode::NotFound);
        assert_eq!(rejection.cause, "/nope.html");
    }

    #[test]
    fn test_open_directory_is_403() {
        let dir = docroot();
        let rejection = StaticFile::open(dir.path(), "/docs").unwrap_err();
        assert_eq!(rejection.status, StatusCode::Forbidden);
        assert_eq!(rejection.detail, "cannot read this file");
    }

    #[test]
    fn test_open_cgi_is_501() {
        let dir = docroot();
        let rejection = StaticFile::open(dir.path(), "/cgi-bin/script.sh").unwrap_err();
        assert_eq!(rejection.status, StatusCode::NotImplemented);
        assert_eq!(rejection.detail, "dynamic content not supported");
    }

    #[cfg(unix)]
    #[test]
    fn test_open_unreadable_is_403() {
        use std::os::unix::fs::PermissionsExt;

        let dir = docroot();
        let path = dir.path().join("locked.txt");
        fs::write(&path, "secret").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o200)).unwrap();

        let rejection = StaticFile::open(dir.path(), "/locked.txt").unwrap_err();
        assert_eq!(rejection.status, StatusCode::Forbidden);
    }

    #[test]
    fn test_rejection_response() {
        let rejection = Rejection::new(StatusCode::NotFound, "/x", "file not found on server");
        let response = rejection.response();
        assert_eq!(response.status(), StatusCode::NotFound);
        assert!(String::from_utf8_lossy(response.body()).contains("file not found on server: /x"));
    }

    // ==================== Servicio ====================

    #[test]
    fn test_serve_file_writes_headers_and_body() {
        let dir = docroot();
        let file = StaticFile::open(dir.path(), "/index.html").unwrap();

        let mut out = Vec::new();
        serve_file(&mut out, &file, "/index.html").unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Server: Multithreaded WebServer\r\n"));
        assert!(text.contains("Content-Length: 13\r\n"));
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.ends_with("\r\n\r\n<h1>home</h1>"));
    }

    #[test]
    fn test_serve_empty_file() {
        let dir = docroot();
        let file = StaticFile::open(dir.path(), "/empty.txt").unwrap();

        let mut out = Vec::new();
        serve_file(&mut out, &file, "/empty.txt").unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_serve_vanished_file() {
        let dir = docroot();
        let file = StaticFile::open(dir.path(), "/notes.txt").unwrap();
        fs::remove_file(&file.path).unwrap();

        let mut out = Vec::new();
        let err = serve_file(&mut out, &file, "/notes.txt").unwrap_err();

        assert!(matches!(err, HandlerError::Vanished { status: StatusCode::NotFound, .. }));
        assert!(String::from_utf8(out).unwrap().starts_with("HTTP/1.0 404 Not Found\r\n"));
    }
}

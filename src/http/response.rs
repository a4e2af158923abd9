//! # Construcción de Respuestas HTTP
//!
//! API para construir respuestas HTTP/1.0 y convertirlas a bytes.
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Server: Multithreaded WebServer\r\n
//! Content-Length: 13\r\n
//! Content-Type: text/html\r\n
//! \r\n
//! <html>...</html>
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use sched_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "text/plain")
//!     .with_body("Hello");
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.0 200 OK\r\n"));
//! ```

use super::StatusCode;
use std::collections::BTreeMap;

/// Valor del header `Server` en todas las respuestas
pub const SERVER_NAME: &str = "Multithreaded WebServer";

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers ordenados por nombre para que la salida sea estable
    headers: BTreeMap<String, String>,

    body: Vec<u8>,
}

impl Response {
    /// Crea una nueva respuesta con el código de estado especificado
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header a la respuesta (si ya existe, se sobrescribe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el cuerpo desde un string y calcula `Content-Length`
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el cuerpo desde bytes y calcula `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self.headers.insert("Content-Length".to_string(), self.body.len().to_string());
        self
    }

    /// Respuesta JSON exitosa (200 OK)
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Server", SERVER_NAME)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Página HTML de error
    ///
    /// `cause` es lo que provocó el error (el método, el archivo) y `detail`
    /// la explicación legible.
    ///
    /// ```
    /// use sched_server::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound, "./missing.html", "file not found on server");
    /// let body = String::from_utf8(response.body().to_vec()).unwrap();
    /// assert!(body.contains("<h2>404: Not Found</h2>"));
    /// assert!(body.contains("file not found on server: ./missing.html"));
    /// ```
    pub fn error(status: StatusCode, cause: &str, detail: &str) -> Self {
        let body = format!(
            "<!doctype html>\r\n\
             <head><title>WebServer Error</title></head>\r\n\
             <body><h2>{}: {}</h2><p>{}: {}</p></body>\r\n\
             </html>\r\n",
            status.as_u16(),
            status.reason_phrase(),
            detail,
            html_escape(cause),
        );

        Self::new(status)
            .with_header("Server", SERVER_NAME)
            .with_header("Content-Type", "text/html")
            .with_body(&body)
    }

    /// Status line y headers, terminados en la línea vacía
    ///
    /// Útil cuando el body se escribe aparte (archivos mapeados en memoria).
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut result = format!("HTTP/1.0 {}\r\n", self.status).into_bytes();

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result
    }

    /// Respuesta completa lista para enviar por el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// La causa puede venir del cliente (URI, método): no se refleja como HTML
fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

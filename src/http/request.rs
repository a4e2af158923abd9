//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser HTTP/1.0 escrito desde cero. Solo se necesita la request line y
//! los headers: el servidor nunca lee body.
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! GET /docs/index.html HTTP/1.0\r\n
//! Host: localhost:10000\r\n
//! User-Agent: curl/7.68.0\r\n
//! \r\n
//! ```

use std::collections::HashMap;
use std::io::{self, BufRead, Read};

/// Máximo de bytes por línea (request line o header)
pub const MAX_LINE: usize = 8192;

/// Máximo de bytes de toda la cabecera del request
pub const MAX_HEAD: usize = 64 * 1024;

/// Métodos HTTP reconocidos
///
/// Solo `GET` se sirve; el resto se responde con 501.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// HEAD - Reconocido pero no implementado
    HEAD,

    /// POST - Reconocido pero no implementado
    POST,
}

impl Method {
    /// Parsea un método HTTP sin distinguir mayúsculas
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
        }
    }

    /// ¿El servidor sabe atender este método?
    pub fn is_supported(&self) -> bool {
        matches!(self, Method::GET)
    }
}

/// Representa un request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// URI tal como llegó, sin la query string (ej: "/docs/index.html")
    path: String,

    /// Query string cruda, si había '?'
    query: Option<String>,

    headers: HashMap<String, String>,

    /// Versión HTTP ("HTTP/1.0" o "HTTP/1.1")
    version: String,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Formato inválido de la request line
    InvalidRequestLine,

    /// Método HTTP desconocido
    UnsupportedMethod(String),

    /// Versión HTTP distinta de 1.0/1.1
    InvalidHttpVersion(String),

    /// Header malformado
    InvalidHeader(String),

    /// Request vacío
    EmptyRequest,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidRequestLine => write!(f, "Invalid request line format"),
            ParseError::UnsupportedMethod(m) => write!(f, "Unsupported HTTP method: {}", m),
            ParseError::InvalidHttpVersion(v) => write!(f, "Invalid HTTP version: {}", v),
            ParseError::InvalidHeader(h) => write!(f, "Invalid header: {}", h),
            ParseError::EmptyRequest => write!(f, "Empty request"),
        }
    }
}

impl std::error::Error for ParseError {}

impl Request {
    /// Lee del socket la cabecera completa (hasta la línea vacía o EOF)
    ///
    /// Devuelve `InvalidData` si una línea supera `MAX_LINE` bytes (contando
    /// el `\n`) o si la cabecera completa supera `MAX_HEAD`.
    pub fn read_head<R: BufRead>(reader: &mut R) -> io::Result<Vec<u8>> {
        let mut head = Vec::new();

        loop {
            let mut line = Vec::new();
            let n = reader.by_ref().take(MAX_LINE as u64).read_until(b'\n', &mut line)?;
            if n == 0 {
                break;
            }

            // Sin '\n' al llegar al límite: la línea sigue y no cabe
            if n == MAX_LINE && line.last() != Some(&b'\n') {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "request line too long"));
            }

            head.extend_from_slice(&line);
            if head.len() > MAX_HEAD {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "request head too large"));
            }

            // Línea vacía: fin de los headers
            if line == b"\r\n" || line == b"\n" {
                break;
            }
        }

        Ok(head)
    }

    /// Parsea un request HTTP/1.0 desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use sched_server::http::Request;
    ///
    /// let raw = b"GET /index.html?v=2 HTTP/1.0\r\nHost: localhost\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/index.html");
    /// assert_eq!(request.query(), Some("v=2"));
    /// assert_eq!(request.header("host"), Some("localhost"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let request_str = std::str::from_utf8(buffer)
            .map_err(|_| ParseError::InvalidRequestLine)?;

        if request_str.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        // `lines()` acepta tanto "\r\n" como "\n"
        let mut lines = request_str.lines();
        let request_line = lines.next().ok_or(ParseError::EmptyRequest)?;

        let (method, path, query, version) = Self::parse_request_line(request_line)?;
        let headers = Self::parse_headers(lines)?;

        Ok(Request {
            method,
            path,
            query,
            headers,
            version,
        })
    }

    /// Parsea la request line: `GET /path?query HTTP/1.0`
    fn parse_request_line(line: &str) -> Result<(Method, String, Option<String>, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;

        let (path, query) = match parts[1].split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (parts[1].to_string(), None),
        };

        if !path.starts_with('/') {
            return Err(ParseError::InvalidRequestLine);
        }

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, query, version))
    }

    /// Parsea los headers `Name: Value`; los nombres se guardan en minúscula
    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }

            match line.split_once(':') {
                Some((name, value)) => {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                None => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(headers)
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Obtiene un header sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

//! # Módulo HTTP
//!
//! Implementa lo mínimo de HTTP/1.0 que necesita un servidor de archivos
//! estáticos:
//!
//! - Lectura y parsing de la request line y los headers
//! - Construcción de responses (incluida la página HTML de error)
//! - Códigos de estado
//!
//! Cada conexión atiende un único request y se cierra (HTTP/1.0 sin
//! keep-alive).

pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;

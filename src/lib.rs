//! # Sched Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de archivos estáticos con un pool fijo de workers y
//! una cola acotada de conexiones pendientes, planificada con FIFO, SFF
//! (archivo más pequeño primero) o RANDOM.
//!
//! ## Arquitectura
//!
//! - `scheduler`: la cola acotada (monitor con `Mutex` + dos `Condvar`) y
//!   la política de planificación
//! - `workers`: el pool de workers y los traits `Connection` /
//!   `RequestHandler`
//! - `server`: el acceptor TCP y el servicio de archivos estáticos
//! - `http`: parsing de requests y construcción de responses HTTP/1.0
//! - `metrics`: recolección de métricas (expuestas en `/metrics`)
//! - `config`, `error`, `logging`: configuración, tipos de error y tracing
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use sched_server::config::Config;
//! use sched_server::scheduler::SchedulingPolicy;
//! use sched_server::server::Server;
//!
//! let config = Config {
//!     root: "./public".into(),
//!     schedalg: SchedulingPolicy::ShortestFirst,
//!     ..Config::default()
//! };
//! let mut server = Server::new(config)?;
//! server.run()?;
//! # Ok::<(), sched_server::error::ServerError>(())
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod scheduler;
pub mod server;
pub mod workers;

//! Tests de integración para el servidor HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero, con un
//! directorio temporal como document root.

use sched_server::config::Config;
use sched_server::scheduler::SchedulingPolicy;
use sched_server::server::Server;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Archivos de prueba del document root
fn docroot() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    std::fs::write(dir.path().join("small.txt"), "tiny").unwrap();
    std::fs::write(dir.path().join("large.txt"), "x".repeat(256 * 1024)).unwrap();
    std::fs::write(dir.path().join("logo.png"), [0x89u8, b'P', b'N', b'G']).unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs").join("index.html"), "docs home").unwrap();
    dir
}

/// Levanta un servidor en background y devuelve su dirección
fn start_server(root: &TempDir, policy: SchedulingPolicy) -> SocketAddr {
    let config = Config {
        port: 0,
        root: root.path().to_path_buf(),
        threads: 4,
        buffers: 8,
        schedalg: policy,
        ..Config::default()
    };

    let mut server = Server::new(config).expect("valid config");
    let addr = server.bind().expect("bind to ephemeral port");

    thread::spawn(move || {
        let _ = server.run();
    });

    addr
}

/// Envía un request crudo y retorna la response completa
fn send_raw(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw).unwrap();
    stream.flush().unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).expect("read response");
    response
}

fn get(addr: SocketAddr, path: &str) -> String {
    let raw = format!("GET {} HTTP/1.0\r\nHost: localhost\r\n\r\n", path);
    String::from_utf8_lossy(&send_raw(addr, raw.as_bytes())).into_owned()
}

/// Extrae el body de una response HTTP
fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

// ==================== Archivos estáticos ====================

#[test]
fn test_serves_html_file() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::Fifo);

    let response = get(addr, "/index.html");

    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "got: {}", response);
    assert!(response.contains("Server: Multithreaded WebServer\r\n"));
    assert!(response.contains("Content-Length: 13\r\n"));
    assert!(response.contains("Content-Type: text/html\r\n"));
    assert_eq!(extract_body(&response), "<h1>home</h1>");
}

#[test]
fn test_serves_directory_index() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::Fifo);

    let response = get(addr, "/docs/");
    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert_eq!(extract_body(&response), "docs home");
}

#[test]
fn test_serves_binary_file() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::Fifo);

    let response = send_raw(addr, b"GET /logo.png HTTP/1.0\r\n\r\n");
    let head_end = response.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
    let head = String::from_utf8_lossy(&response[..head_end]);

    assert!(head.contains("Content-Type: image/png"));
    assert_eq!(&response[head_end + 4..], &[0x89u8, b'P', b'N', b'G']);
}

#[test]
fn test_serves_large_file_completely() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::ShortestFirst);

    let response = get(addr, "/large.txt");
    assert!(response.contains("Content-Length: 262144\r\n"));
    assert_eq!(extract_body(&response).len(), 256 * 1024);
}

#[test]
fn test_query_string_is_ignored() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::Fifo);

    let response = get(addr, "/small.txt?version=3");
    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert_eq!(extract_body(&response), "tiny");
}

// ==================== Errores ====================

#[test]
fn test_missing_file_is_404() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::Fifo);

    let response = get(addr, "/nope.html");
    assert!(response.starts_with("HTTP/1.0 404 Not Found\r\n"));
    assert!(response.contains("Content-Type: text/html\r\n"));
    assert!(response.contains("<h2>404: Not Found</h2>"));
}

#[test]
fn test_traversal_is_403() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::Fifo);

    let response = get(addr, "/../etc/passwd");
    assert!(response.starts_with("HTTP/1.0 403 Forbidden\r\n"));
    assert!(response.contains("directory traversal attempt blocked"));
}

#[test]
fn test_directory_without_slash_is_403() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::Fifo);

    let response = get(addr, "/docs");
    assert!(response.starts_with("HTTP/1.0 403 Forbidden\r\n"));
}

#[test]
fn test_post_is_501() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::Fifo);

    let response = String::from_utf8_lossy(&send_raw(addr, b"POST /index.html HTTP/1.0\r\n\r\n")).into_owned();
    assert!(response.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
    assert!(response.contains("server does not implement this method: POST"));
}

#[test]
fn test_malformed_request_is_400() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::Fifo);

    let response = String::from_utf8_lossy(&send_raw(addr, b"GET\r\n\r\n")).into_owned();
    assert!(response.starts_with("HTTP/1.0 400 Bad Request\r\n"));
}

// ==================== Métricas ====================

#[test]
fn test_metrics_endpoint() {
    let root = docroot();
    let addr = start_server(&root, SchedulingPolicy::Random);

    get(addr, "/index.html");
    get(addr, "/nope.html");

    let response = get(addr, "/metrics");
    assert!(response.contains("Content-Type: application/json\r\n"));

    let json: serde_json::Value = serde_json::from_str(extract_body(&response)).unwrap();
    assert_eq!(json["queue"]["policy"], "RANDOM");
    assert_eq!(json["queue"]["capacity"], 8);
    assert_eq!(json["queue"]["admitted"], 1);
    assert_eq!(json["server"]["rejected"], 1);
    assert_eq!(json["server"]["status_codes"]["404"], 1);
}

// ==================== Concurrencia ====================

/// Muchos clientes a la vez contra una cola más chica que la carga:
/// cada uno recibe su archivo completo, exactamente una vez.
fn run_concurrent_clients(policy: SchedulingPolicy) {
    let root = docroot();
    let addr = start_server(&root, policy);

    let clients: Vec<_> = (0..32)
        .map(|i| {
            thread::spawn(move || {
                let (path, body_len) = if i % 2 == 0 { ("/small.txt", 4) } else { ("/large.txt", 256 * 1024) };
                let response = get(addr, path);
                assert!(response.starts_with("HTTP/1.0 200 OK\r\n"), "client {} got: {:.80}", i, response);
                assert_eq!(extract_body(&response).len(), body_len);
            })
        })
        .collect();

    for client in clients {
        client.join().expect("client thread");
    }
}

#[test]
fn test_concurrent_clients_fifo() {
    run_concurrent_clients(SchedulingPolicy::Fifo);
}

#[test]
fn test_concurrent_clients_sff() {
    run_concurrent_clients(SchedulingPolicy::ShortestFirst);
}

#[test]
fn test_concurrent_clients_random() {
    run_concurrent_clients(SchedulingPolicy::Random);
}

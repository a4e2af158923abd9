//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta y agrega métricas del servidor en tiempo real.

use crate::scheduler::QueueStats;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Máximo de muestras a guardar (para calcular percentiles)
const MAX_SAMPLES: usize = 10_000;

/// Máximo de rutas distintas contadas por separado
const MAX_PATHS: usize = 1_000;

/// Clave común de los requests rechazados por el acceptor (la URI viene del cliente)
pub const REJECTED_PATH: &str = "<rejected>";

/// Clave común de las rutas servidas una vez lleno el mapa
pub const OTHER_PATH: &str = "<other>";

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

/// Datos internos de métricas
struct MetricsData {
    /// Contador total de requests respondidos
    total_requests: u64,

    /// Requests por código de estado
    status_codes: HashMap<u16, u64>,

    /// Latencias de servicio en microsegundos (aceptación → respuesta)
    latencies: VecDeque<u64>,

    /// Tiempo en cola en microsegundos (admisión → worker)
    queue_waits: VecDeque<u64>,

    /// Requests por ruta
    requests_per_path: HashMap<String, u64>,

    /// Workers atendiendo una conexión ahora mismo
    busy_workers: u64,

    /// Handlers que fallaron o hicieron panic
    handler_faults: u64,

    /// Conexiones rechazadas antes de encolar (4xx/5xx del acceptor)
    rejected: u64,
}

impl MetricsData {
    fn record(&mut self, path: &str, status_code: u16, latency: Duration) {
        self.total_requests += 1;
        *self.status_codes.entry(status_code).or_insert(0) += 1;
        push_sample(&mut self.latencies, latency.as_micros() as u64);

        // Varias URIs pueden nombrar el mismo archivo ("/a", "/./a"): el mapa se acota
        let key = if self.requests_per_path.contains_key(path) || self.requests_per_path.len() < MAX_PATHS {
            path
        } else {
            OTHER_PATH
        };
        *self.requests_per_path.entry(key.to_string()).or_insert(0) += 1;
    }
}

fn push_sample(samples: &mut VecDeque<u64>, value: u64) {
    if samples.len() >= MAX_SAMPLES {
        samples.pop_front();
    }
    samples.push_back(value);
}

impl MetricsCollector {
    /// Crea un nuevo collector de métricas
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData {
                total_requests: 0,
                status_codes: HashMap::new(),
                latencies: VecDeque::with_capacity(MAX_SAMPLES),
                queue_waits: VecDeque::with_capacity(MAX_SAMPLES),
                requests_per_path: HashMap::new(),
                busy_workers: 0,
                handler_faults: 0,
                rejected: 0,
            })),
            start_time: Instant::now(),
        }
    }

    fn data(&self) -> MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra un request respondido
    pub fn record_request(&self, path: &str, status_code: u16, latency: Duration) {
        self.data().record(path, status_code, latency);
    }

    /// Registra un request respondido por el acceptor sin pasar por la cola
    ///
    /// Se cuenta bajo `REJECTED_PATH`, no bajo la URI pedida.
    pub fn record_rejection(&self, status_code: u16, latency: Duration) {
        let mut data = self.data();
        data.record(REJECTED_PATH, status_code, latency);
        data.rejected += 1;
    }

    /// Registra cuánto esperó una entrada en la cola
    pub fn record_queue_wait(&self, wait: Duration) {
        let mut data = self.data();
        push_sample(&mut data.queue_waits, wait.as_micros() as u64);
    }

    /// Registra un handler que falló o hizo panic
    pub fn record_handler_fault(&self) {
        self.data().handler_faults += 1;
    }

    /// Un worker tomó una conexión
    pub fn worker_busy(&self) {
        self.data().busy_workers += 1;
    }

    /// Un worker terminó con su conexión
    pub fn worker_idle(&self) {
        let mut data = self.data();
        data.busy_workers = data.busy_workers.saturating_sub(1);
    }

    pub fn busy_workers(&self) -> u64 {
        self.data().busy_workers
    }

    /// Calcula percentiles (p50, p95, p99, promedio)
    fn calculate_percentiles(samples: &VecDeque<u64>) -> (u64, u64, u64, u64) {
        if samples.is_empty() {
            return (0, 0, 0, 0);
        }

        let mut sorted: Vec<u64> = samples.iter().copied().collect();
        sorted.sort_unstable();

        let len = sorted.len();
        let p50 = sorted[len * 50 / 100];
        let p95 = sorted[len * 95 / 100];
        let p99 = sorted[len * 99 / 100];
        let avg = sorted.iter().sum::<u64>() / len as u64;

        (p50, p95, p99, avg)
    }

    /// Obtiene un snapshot de las métricas
    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.data();
        let (p50, p95, p99, avg) = Self::calculate_percentiles(&data.latencies);
        let (wait_p50, _, wait_p99, wait_avg) = Self::calculate_percentiles(&data.queue_waits);

        let mut top_paths: Vec<(String, u64)> = data
            .requests_per_path
            .iter()
            .map(|(path, count)| (path.clone(), *count))
            .collect();
        top_paths.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_paths.truncate(10);

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            total_requests: data.total_requests,
            rejected: data.rejected,
            status_codes: data.status_codes.iter().map(|(k, v)| (*k, *v)).collect(),
            top_paths,
            busy_workers: data.busy_workers,
            handler_faults: data.handler_faults,
            latency_p50_us: p50,
            latency_p95_us: p95,
            latency_p99_us: p99,
            latency_avg_us: avg,
            queue_wait_p50_us: wait_p50,
            queue_wait_p99_us: wait_p99,
            queue_wait_avg_us: wait_avg,
        }
    }

    /// Métricas del servidor junto con el estado de la cola, en JSON
    pub fn to_json(&self, queue: &QueueStats) -> serde_json::Value {
        serde_json::json!({
            "server": self.snapshot(),
            "queue": queue,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot de métricas (para uso externo)
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub rejected: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub top_paths: Vec<(String, u64)>,
    pub busy_workers: u64,
    pub handler_faults: u64,
    pub latency_p50_us: u64,
    pub latency_p95_us: u64,
    pub latency_p99_us: u64,
    pub latency_avg_us: u64,
    pub queue_wait_p50_us: u64,
    pub queue_wait_p99_us: u64,
    pub queue_wait_avg_us: u64,
}

//! # Cola de Planificación Acotada
//! src/scheduler/queue.rs
//!
//! Buffer circular de capacidad fija compartido entre el acceptor (productor)
//! y los workers (consumidores). Un solo `Mutex` protege todo el estado y dos
//! `Condvar` implementan el monitor clásico:
//!
//! - `admit` bloquea mientras `count == capacity` (backpressure)
//! - `remove` bloquea mientras `count == 0`
//!
//! Las entradas ocupadas forman siempre un único tramo contiguo
//! `[head, head + count)` (módulo capacidad). Con SFF ese tramo está ordenado
//! ascendente por `size`; con FIFO y RANDOM conserva el orden de llegada.

use crate::error::ConfigError;
use crate::scheduler::policy::{Insertion, Removal, SchedulingPolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Una conexión pendiente junto con el tamaño del recurso que pide
#[derive(Debug)]
pub struct QueueEntry<C> {
    pub connection: C,
    /// Bytes del archivo a servir (clave de orden para SFF)
    pub size: u64,
}

impl<C> QueueEntry<C> {
    pub fn new(connection: C, size: u64) -> Self {
        Self { connection, size }
    }
}

/// Estado interno protegido por el mutex
struct Ring<C> {
    slots: Vec<Option<QueueEntry<C>>>,
    head: usize,
    count: usize,
    rng: StdRng,
    admitted: u64,
    removed: u64,
    overloaded: u64,
}

impl<C> Ring<C> {
    fn new(capacity: usize, rng: StdRng) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            count: 0,
            rng,
            admitted: 0,
            removed: 0,
            overloaded: 0,
        }
    }

    /// Índice físico de la posición lógica `offset` contada desde la cabeza
    fn physical(&self, offset: usize) -> usize {
        (self.head + offset) % self.slots.len()
    }

    /// Inserta asumiendo que hay al menos un slot libre
    fn insert(&mut self, entry: QueueEntry<C>, insertion: Insertion) {
        let mut offset = self.count;

        if insertion == Insertion::SortedBySize {
            // Recorrer desde la cola hacia la cabeza desplazando los
            // estrictamente mayores: los iguales quedan delante (estable).
            while offset > 0 {
                let prev = self.physical(offset - 1);
                let larger = self.slots[prev]
                    .as_ref()
                    .map_or(false, |queued| queued.size > entry.size);
                if !larger {
                    break;
                }
                let gap = self.physical(offset);
                self.slots[gap] = self.slots[prev].take();
                offset -= 1;
            }
        }

        let slot = self.physical(offset);
        self.slots[slot] = Some(entry);
        self.count += 1;
        self.admitted += 1;
    }

    /// Extrae según la regla, asumiendo `count > 0`
    fn take(&mut self, removal: Removal) -> Option<QueueEntry<C>> {
        let offset = match removal {
            Removal::Head => 0,
            Removal::UniformRandom => self.rng.gen_range(0..self.count),
        };

        let index = self.physical(offset);
        let entry = self.slots[index].take();

        // Cerrar el hueco: lo que estaba entre la cabeza y el elegido
        // avanza un slot hacia la cola, conservando su orden relativo.
        for i in (1..=offset).rev() {
            let dst = self.physical(i);
            let src = self.physical(i - 1);
            self.slots[dst] = self.slots[src].take();
        }

        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        self.removed += 1;
        entry
    }

    fn sizes(&self) -> Vec<u64> {
        (0..self.count)
            .filter_map(|offset| self.slots[self.physical(offset)].as_ref())
            .map(|entry| entry.size)
            .collect()
    }
}

/// Cola acotada compartida entre acceptor y workers
///
/// Se crea una vez al arrancar y se comparte con `Arc`.
pub struct SchedulingQueue<C> {
    ring: Mutex<Ring<C>>,

    /// Señala a los workers que hay trabajo
    not_empty: Condvar,

    /// Señala al acceptor que hay espacio
    not_full: Condvar,

    capacity: usize,
    policy: SchedulingPolicy,
}

impl<C> SchedulingQueue<C> {
    /// Crea una cola vacía con la fuente aleatoria sembrada desde el SO
    pub fn new(capacity: usize, policy: SchedulingPolicy) -> Result<Self, ConfigError> {
        Self::with_rng(capacity, policy, StdRng::from_entropy())
    }

    /// Igual que `new` pero con semilla fija (resultados reproducibles)
    pub fn with_seed(capacity: usize, policy: SchedulingPolicy, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(capacity, policy, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, policy: SchedulingPolicy, rng: StdRng) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(Self {
            ring: Mutex::new(Ring::new(capacity, rng)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            policy,
        })
    }

    // Ningún código externo corre con el lock tomado, así que un panic en
    // otro thread no puede dejar el anillo a medias.
    fn lock(&self) -> MutexGuard<'_, Ring<C>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admite una entrada, bloqueando mientras la cola esté llena
    pub fn admit(&self, entry: QueueEntry<C>) {
        let mut ring = self.lock();

        while ring.count == self.capacity {
            ring = self.not_full.wait(ring).unwrap_or_else(PoisonError::into_inner);
        }

        ring.insert(entry, self.policy.insertion());
        self.not_empty.notify_one();
    }

    /// Admite sin bloquear
    ///
    /// Si la cola está llena devuelve la entrada al llamador.
    pub fn try_admit(&self, entry: QueueEntry<C>) -> Result<(), QueueEntry<C>> {
        let mut ring = self.lock();

        if ring.count == self.capacity {
            ring.overloaded += 1;
            return Err(entry);
        }

        ring.insert(entry, self.policy.insertion());
        self.not_empty.notify_one();
        Ok(())
    }

    /// Admite esperando como máximo `timeout` a que haya espacio
    ///
    /// Si vence el plazo devuelve la entrada para que el llamador responda
    /// "sobrecargado" en vez de seguir esperando.
    pub fn admit_timeout(&self, entry: QueueEntry<C>, timeout: Duration) -> Result<(), QueueEntry<C>> {
        let capacity = self.capacity;
        let ring = self.lock();

        let (mut ring, _) = self
            .not_full
            .wait_timeout_while(ring, timeout, |ring| ring.count == capacity)
            .unwrap_or_else(PoisonError::into_inner);

        if ring.count == capacity {
            ring.overloaded += 1;
            return Err(entry);
        }

        ring.insert(entry, self.policy.insertion());
        self.not_empty.notify_one();
        Ok(())
    }

    /// Extrae la siguiente entrada según la política
    ///
    /// Bloquea hasta que haya una disponible.
    pub fn remove(&self) -> QueueEntry<C> {
        let mut ring = self.lock();

        loop {
            while ring.count == 0 {
                ring = self.not_empty.wait(ring).unwrap_or_else(PoisonError::into_inner);
            }

            let entry = ring.take(self.policy.removal());
            self.not_full.notify_one();

            if let Some(entry) = entry {
                return entry;
            }
        }
    }

    /// Extrae sin bloquear; `None` si la cola está vacía
    pub fn try_remove(&self) -> Option<QueueEntry<C>> {
        let mut ring = self.lock();

        if ring.count == 0 {
            return None;
        }

        let entry = ring.take(self.policy.removal());
        self.not_full.notify_one();
        entry
    }

    /// Número de entradas pendientes
    pub fn len(&self) -> usize {
        self.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> SchedulingPolicy {
        self.policy
    }

    /// Tamaños pendientes leídos de la cabeza a la cola
    pub fn pending_sizes(&self) -> Vec<u64> {
        self.lock().sizes()
    }

    /// Estadísticas de la cola
    pub fn stats(&self) -> QueueStats {
        let ring = self.lock();

        QueueStats {
            policy: self.policy,
            capacity: self.capacity,
            pending: ring.count,
            admitted: ring.admitted,
            removed: ring.removed,
            overloaded: ring.overloaded,
        }
    }
}

/// Estadísticas de una cola
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub policy: SchedulingPolicy,
    pub capacity: usize,
    pub pending: usize,
    pub admitted: u64,
    pub removed: u64,
    /// Admisiones rechazadas por cola llena (solo con timeout)
    pub overloaded: u64,
}

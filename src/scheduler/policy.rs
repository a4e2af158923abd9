//! # Políticas de Planificación
//! src/scheduler/policy.rs
//!
//! Traduce el modo configurado a las dos reglas que usa la cola:
//!
//! | Política | Inserción              | Extracción              |
//! |----------|------------------------|-------------------------|
//! | FIFO     | al final               | la cabeza               |
//! | SFF      | ordenada por tamaño    | la cabeza               |
//! | RANDOM   | al final               | posición uniforme       |
//!
//! La política se fija al arrancar y no cambia durante la vida del proceso.

use crate::error::ConfigError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Modo de planificación del servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SchedulingPolicy {
    /// First In, First Out
    #[default]
    #[serde(rename = "FIFO")]
    Fifo,

    /// Shortest File First: el archivo más pequeño se atiende primero
    #[serde(rename = "SFF")]
    ShortestFirst,

    /// Cualquier request pendiente, elegido uniformemente
    #[serde(rename = "RANDOM")]
    Random,
}

/// Dónde se coloca una entrada nueva
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Al final lógico de la cola (`head + count`)
    Append,
    /// En su posición ordenada ascendente por `size`
    SortedBySize,
}

/// Qué entrada se entrega al worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Siempre la cabeza
    Head,
    /// Offset uniforme en `[0, count)` desde la cabeza
    UniformRandom,
}

impl SchedulingPolicy {
    /// Regla de inserción de esta política
    pub fn insertion(self) -> Insertion {
        match self {
            SchedulingPolicy::Fifo | SchedulingPolicy::Random => Insertion::Append,
            SchedulingPolicy::ShortestFirst => Insertion::SortedBySize,
        }
    }

    /// Regla de extracción de esta política
    pub fn removal(self) -> Removal {
        match self {
            SchedulingPolicy::Fifo | SchedulingPolicy::ShortestFirst => Removal::Head,
            SchedulingPolicy::Random => Removal::UniformRandom,
        }
    }

    /// Nombre canónico (el mismo que acepta `-s/--schedalg`)
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulingPolicy::Fifo => "FIFO",
            SchedulingPolicy::ShortestFirst => "SFF",
            SchedulingPolicy::Random => "RANDOM",
        }
    }
}

impl FromStr for SchedulingPolicy {
    type Err = ConfigError;

    /// Parsea el nombre de la política (sin distinguir mayúsculas)
    ///
    /// ```
    /// use sched_server::scheduler::SchedulingPolicy;
    ///
    /// let policy: SchedulingPolicy = "sff".parse().unwrap();
    /// assert_eq!(policy, SchedulingPolicy::ShortestFirst);
    /// assert!("LIFO".parse::<SchedulingPolicy>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FIFO" | "FCFS" => Ok(SchedulingPolicy::Fifo),
            "SFF" | "SJF" | "SHORTEST" | "SHORTESTFIRST" => Ok(SchedulingPolicy::ShortestFirst),
            "RANDOM" | "RND" => Ok(SchedulingPolicy::Random),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        assert_eq!("FIFO".parse::<SchedulingPolicy>().unwrap(), SchedulingPolicy::Fifo);
        assert_eq!("SFF".parse::<SchedulingPolicy>().unwrap(), SchedulingPolicy::ShortestFirst);
        assert_eq!("RANDOM".parse::<SchedulingPolicy>().unwrap(), SchedulingPolicy::Random);
    }

    #[test]
    fn test_parse_aliases_and_case() {
        assert_eq!("fcfs".parse::<SchedulingPolicy>().unwrap(), SchedulingPolicy::Fifo);
        assert_eq!(" sjf ".parse::<SchedulingPolicy>().unwrap(), SchedulingPolicy::ShortestFirst);
        assert_eq!("Rnd".parse::<SchedulingPolicy>().unwrap(), SchedulingPolicy::Random);
    }

    #[test]
    fn test_parse_unknown() {
        let result = "priority".parse::<SchedulingPolicy>();
        assert_eq!(result, Err(ConfigError::UnknownPolicy("priority".to_string())));
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for policy in [SchedulingPolicy::Fifo, SchedulingPolicy::ShortestFirst, SchedulingPolicy::Random] {
            assert_eq!(policy.to_string().parse::<SchedulingPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_rules_per_policy() {
        assert_eq!(SchedulingPolicy::Fifo.insertion(), Insertion::Append);
        assert_eq!(SchedulingPolicy::Fifo.removal(), Removal::Head);

        assert_eq!(SchedulingPolicy::ShortestFirst.insertion(), Insertion::SortedBySize);
        assert_eq!(SchedulingPolicy::ShortestFirst.removal(), Removal::Head);

        assert_eq!(SchedulingPolicy::Random.insertion(), Insertion::Append);
        assert_eq!(SchedulingPolicy::Random.removal(), Removal::UniformRandom);
    }

    #[test]
    fn test_default_is_fifo() {
        assert_eq!(SchedulingPolicy::default(), SchedulingPolicy::Fifo);
    }
}

//! # Tipos de Error
//! src/error.rs
//!
//! Errores del servicio agrupados por origen:
//!
//! | Categoría | Tipo | Qué hace el sistema |
//! |-----------|------|---------------------|
//! | Validación | `JobError::InvalidDigits`, `ExceedsMaximum`, `MalformedJobId` | Se responde al cliente, nunca se encola |
//! | Cálculo | `ComputeError` | El worker marca el job como FAILED |
//! | Infraestructura | `StoreError`, `JobError::QueueFull`, `QueueClosed` | Se loguea, no se reintenta |

use crate::jobs::record::JobState;
use thiserror::Error;

/// Errores del motor de series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    #[error("n must be >= 1")]
    ZeroDigits,

    #[error("working precision ({working} digits) must exceed requested digits ({requested})")]
    InsufficientPrecision { requested: u32, working: u32 },

    #[error("guard_terms must be >= 1")]
    NoGuardTerms,

    #[error("term count overflow for {0} digits")]
    TermCountOverflow(u32),

    #[error("division by zero")]
    DivisionByZero,

    #[error("square root of a negative value")]
    NegativeSqrt,

    #[error("cannot round to {digits} digits at scale {scale}")]
    DigitsExceedScale { digits: u32, scale: u32 },
}

/// Errores de un `JobStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errores del sistema de jobs (submit, query, cola y transiciones).
#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid digit count: {0}")]
    InvalidDigits(String),

    #[error("n is too large: {requested} exceeds maximum of {max}")]
    ExceedsMaximum { requested: i64, max: u32 },

    #[error("malformed task_id: {0}")]
    MalformedJobId(String),

    #[error("task not found: {0}")]
    NotFound(String),

    #[error("queue is full (max capacity: {0})")]
    QueueFull(usize),

    #[error("queue is closed")]
    QueueClosed,

    #[error("invalid transition {from:?} -> {to:?}")]
    InvalidTransition { from: JobState, to: JobState },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl JobError {
    /// Indica si el error es culpa del cliente (parámetros inválidos o job inexistente)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            JobError::InvalidDigits(_)
                | JobError::ExceedsMaximum { .. }
                | JobError::MalformedJobId(_)
                | JobError::NotFound(_)
        )
    }
}

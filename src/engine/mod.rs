//! # Motor de Cálculo de π
//!
//! Cálculo puro: recibe un número de dígitos y devuelve π como string
//! decimal, reportando el progreso mediante un callback. No hace I/O ni sabe
//! nada de colas, workers o storage.
//!
//! - `decimal`: punto fijo de precisión arbitraria (`Fixed`)
//! - `chudnovsky`: la serie y el protocolo de progreso

pub mod chudnovsky;
pub mod decimal;

pub use chudnovsky::{compute, SeriesEngine, DEFAULT_GUARD_DIGITS, DEFAULT_GUARD_TERMS};
pub use decimal::Fixed;

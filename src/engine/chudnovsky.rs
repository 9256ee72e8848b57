//! # Serie de Chudnovsky
//! src/engine/chudnovsky.rs
//!
//! Calcula π con la serie de Chudnovsky:
//!
//! ```text
//! 1/π = 12 Σ (-1)^k (6k)! (13591409 + 545140134k) / ((3k)! (k!)^3 640320^(3k+3/2))
//! ```
//!
//! Cada término aporta ~14.181647 dígitos decimales correctos. Los términos se
//! generan con la recurrencia
//!
//! ```text
//! a_k = a_{k-1} * -(6k-5)(2k-1)(6k-1) / (k^3 * 640320^3 / 24)
//! ```
//!
//! y al final `π = 426880 * sqrt(10005) / (13591409 Σa_k + 545140134 Σk·a_k)`.
//!
//! ## Progreso
//!
//! Hay `T + 1` pasos: los `T` términos y la reducción final (raíz, división y
//! redondeo). Después del término `k` se reporta `k / (T + 1)` y al terminar
//! la reducción se reporta exactamente `1.0`.
//!
//! ## Precisión
//!
//! Cada multiplicación trunca hasta 1 ulp. En `Σk·a_k` eso se acumula hasta
//! ~T²/2 ulps y el factor `B/A` lo amplifica ~40 veces, así que el motor suma
//! `2·dígitos(T) + 12` dígitos propios encima de los configurados.

use super::decimal::Fixed;
use crate::error::ComputeError;
use num_bigint::BigInt;

/// Dígitos por término, escalado por 10^6 (14.181647)
const DIGITS_PER_TERM_MICRO: u64 = 14_181_647;

/// 640320^3 / 24
const C3_OVER_24: u64 = 10_939_058_860_032_000;

const A: i64 = 13_591_409;
const B: i64 = 545_140_134;

/// Dígitos extra de precisión de trabajo por defecto
pub const DEFAULT_GUARD_DIGITS: u32 = 20;

/// Términos extra por defecto
pub const DEFAULT_GUARD_TERMS: u32 = 1;

/// Margen fijo sobre `2·dígitos(T)`: cubre el factor ~130 del error
/// acumulado y deja ~10 dígitos de holgura para el redondeo
const SERIES_GUARD_MARGIN: u32 = 12;

/// Dígitos de guarda que exige el error de truncamiento de `terms` términos
fn series_guard_digits(terms: u32) -> u32 {
    let terms_len = terms.checked_ilog10().unwrap_or(0) + 1;
    2 * terms_len + SERIES_GUARD_MARGIN
}

/// Motor de la serie: sin I/O y sin estado compartido
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesEngine {
    guard_digits: u32,
    guard_terms: u32,
}

impl Default for SeriesEngine {
    fn default() -> Self {
        Self {
            guard_digits: DEFAULT_GUARD_DIGITS,
            guard_terms: DEFAULT_GUARD_TERMS,
        }
    }
}

impl SeriesEngine {
    pub fn new(guard_digits: u32, guard_terms: u32) -> Self {
        Self { guard_digits, guard_terms }
    }

    /// Número de términos `T = ceil(n / 14.181647) + guard_terms`
    pub fn term_count(&self, digits: u32) -> Result<u32, ComputeError> {
        if digits == 0 {
            return Err(ComputeError::ZeroDigits);
        }
        if self.guard_terms == 0 {
            return Err(ComputeError::NoGuardTerms);
        }

        let scaled = (digits as u64)
            .checked_mul(1_000_000)
            .ok_or(ComputeError::TermCountOverflow(digits))?;
        let base = scaled.div_ceil(DIGITS_PER_TERM_MICRO);

        u32::try_from(base)
            .ok()
            .and_then(|b| b.checked_add(self.guard_terms))
            .ok_or(ComputeError::TermCountOverflow(digits))
    }

    /// Precisión de trabajo en dígitos:
    /// `digits + guard_digits + 2·dígitos(T) + 12`.
    ///
    /// La parte que depende de `T` no es configurable, así que aun con
    /// `guard_digits = 1` el resultado sale bien redondeado.
    pub fn working_precision(&self, digits: u32) -> Result<u32, ComputeError> {
        if digits == 0 {
            return Err(ComputeError::ZeroDigits);
        }
        if self.guard_digits == 0 {
            return Err(ComputeError::InsufficientPrecision {
                requested: digits,
                working: digits,
            });
        }

        let terms = self.term_count(digits)?;
        let working = digits
            .saturating_add(self.guard_digits)
            .saturating_add(series_guard_digits(terms));
        if working <= digits {
            return Err(ComputeError::InsufficientPrecision {
                requested: digits,
                working,
            });
        }
        Ok(working)
    }

    /// Calcula π con `digits` decimales, llamando `on_progress` después de
    /// cada término y al final de la reducción.
    ///
    /// # Ejemplo
    /// ```
    /// use pi_server::engine::SeriesEngine;
    ///
    /// let pi = SeriesEngine::default().compute(5, |_| {}).unwrap();
    /// assert_eq!(pi, "3.14159");
    /// ```
    pub fn compute<F>(&self, digits: u32, mut on_progress: F) -> Result<String, ComputeError>
    where
        F: FnMut(f64),
    {
        let working = self.working_precision(digits)?;
        let terms = self.term_count(digits)?;
        let steps = terms as f64 + 1.0;

        let c3_over_24 = BigInt::from(C3_OVER_24);
        let mut term = Fixed::one(working);
        let mut sum_a = Fixed::zero(working);
        let mut sum_b = Fixed::zero(working);

        for k in 0..terms {
            if k > 0 {
                let k = BigInt::from(k);
                let num = -((&k * 6u32 - 5u32) * (&k * 2u32 - 1u32) * (&k * 6u32 - 1u32));
                let den = &k * &k * &k * &c3_over_24;
                term = term.mul_ratio(&num, &den)?;
            }
            sum_a += &term;
            sum_b += &term.mul_integer(&BigInt::from(k));

            on_progress((k + 1) as f64 / steps);
        }

        let mut total = sum_a.mul_integer(&BigInt::from(A));
        total += &sum_b.mul_integer(&BigInt::from(B));

        let root = Fixed::from_integer(10005, working).sqrt()?;
        let numerator = root.mul_integer(&BigInt::from(426_880));
        let pi = numerator.div(&total)?;
        let text = pi.round_to(digits)?;

        on_progress(1.0);
        Ok(text)
    }
}

/// Atajo con la configuración por defecto
pub fn compute<F>(digits: u32, on_progress: F) -> Result<String, ComputeError>
where
    F: FnMut(f64),
{
    SeriesEngine::default().compute(digits, on_progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values() {
        assert_eq!(compute(1, |_| {}).unwrap(), "3.1");
        assert_eq!(compute(2, |_| {}).unwrap(), "3.14");
        assert_eq!(compute(3, |_| {}).unwrap(), "3.142");
        assert_eq!(compute(5, |_| {}).unwrap(), "3.14159");
    }

    #[test]
    fn test_rounds_instead_of_truncating() {
        // 3.14159|26... -> la cuarta cifra sube
        assert_eq!(compute(4, |_| {}).unwrap(), "3.1416");
        // 3.14159265358979323846|26 -> 20 dígitos
        assert_eq!(compute(20, |_| {}).unwrap(), "3.14159265358979323846");
        // ...69399375105|82... -> el dígito 50 sube de 0 a 1
        assert_eq!(
            compute(50, |_| {}).unwrap(),
            "3.14159265358979323846264338327950288419716939937511"
        );
    }

    #[test]
    fn test_zero_digits_rejected() {
        assert_eq!(compute(0, |_| {}), Err(ComputeError::ZeroDigits));
    }

    #[test]
    fn test_inconsistent_precision_rejected() {
        let engine = SeriesEngine::new(0, 1);
        assert_eq!(
            engine.compute(10, |_| {}),
            Err(ComputeError::InsufficientPrecision { requested: 10, working: 10 })
        );
    }

    #[test]
    fn test_zero_guard_terms_rejected() {
        let engine = SeriesEngine::new(10, 0);
        assert_eq!(engine.compute(10, |_| {}), Err(ComputeError::NoGuardTerms));
    }

    #[test]
    fn test_working_precision_grows_with_terms() {
        let engine = SeriesEngine::default();
        // T = 2 -> 1 dígito; T = 707 -> 3 dígitos
        assert_eq!(engine.working_precision(1).unwrap(), 1 + 20 + 14);
        assert_eq!(engine.working_precision(10_000).unwrap(), 10_000 + 20 + 18);
        assert_eq!(series_guard_digits(9), 14);
        assert_eq!(series_guard_digits(10), 16);
    }

    #[test]
    fn test_single_guard_digit_still_exact() {
        // Con sólo los dígitos configurados estos n redondeaban mal
        let minimal = SeriesEngine::new(1, 1);
        for n in [15u32, 22, 29, 36, 43, 50, 85, 400] {
            assert_eq!(
                minimal.compute(n, |_| {}).unwrap(),
                compute(n, |_| {}).unwrap(),
                "n = {}",
                n
            );
        }
    }

    #[test]
    fn test_term_count() {
        let engine = SeriesEngine::default();
        assert_eq!(engine.term_count(1).unwrap(), 2);
        assert_eq!(engine.term_count(14).unwrap(), 2);
        assert_eq!(engine.term_count(15).unwrap(), 3);
        assert_eq!(engine.term_count(10_000).unwrap(), 707);
        assert_eq!(engine.term_count(0), Err(ComputeError::ZeroDigits));
    }

    #[test]
    fn test_term_count_overflow() {
        let engine = SeriesEngine::new(10, u32::MAX);
        assert_eq!(engine.term_count(100), Err(ComputeError::TermCountOverflow(100)));
    }

    #[test]
    fn test_progress_sequence() {
        let engine = SeriesEngine::default();
        let terms = engine.term_count(100).unwrap();

        let mut seen = Vec::new();
        engine.compute(100, |f| seen.push(f)).unwrap();

        assert_eq!(seen.len(), terms as usize + 1);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert!(seen.iter().all(|f| *f > 0.0 && *f <= 1.0));
        assert_eq!(*seen.last().unwrap(), 1.0);
        // el último término no llega a 1.0: la reducción es un paso más
        assert!(seen[seen.len() - 2] < 1.0);
    }

    #[test]
    fn test_progress_for_single_digit() {
        let mut seen = Vec::new();
        compute(1, |f| seen.push(f)).unwrap();
        assert_eq!(seen, vec![1.0 / 3.0, 2.0 / 3.0, 1.0]);
    }

    #[test]
    fn test_output_length() {
        for n in [1u32, 7, 14, 15, 29, 64, 333] {
            let pi = compute(n, |_| {}).unwrap();
            let (int_part, frac) = pi.split_once('.').unwrap();
            assert_eq!(int_part, "3");
            assert_eq!(frac.len(), n as usize, "n = {}", n);
        }
    }
}

//! # Decimal de Precisión Arbitraria
//! src/engine/decimal.rs
//!
//! Número en punto fijo decimal: `value / 10^scale`, con `value` un `BigInt`.
//! Todas las operaciones que producen dígitos de π pasan por aquí; no se usa
//! `f64` en ningún momento.

use crate::error::ComputeError;
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, Zero};
use std::ops::AddAssign;

/// Valor decimal en punto fijo con `scale` dígitos fraccionarios
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixed {
    value: BigInt,
    scale: u32,
}

/// 10^exp como BigInt
fn pow10(exp: u32) -> BigInt {
    BigInt::from(10u8).pow(exp)
}

impl Fixed {
    /// El valor 1 con la escala indicada
    pub fn one(scale: u32) -> Self {
        Self { value: pow10(scale), scale }
    }

    /// El valor 0 con la escala indicada
    pub fn zero(scale: u32) -> Self {
        Self { value: BigInt::zero(), scale }
    }

    /// Convierte un entero a punto fijo
    pub fn from_integer(n: i64, scale: u32) -> Self {
        Self { value: BigInt::from(n) * pow10(scale), scale }
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Multiplica por `num / den`, truncando hacia cero.
    ///
    /// Es la operación de la recurrencia entre términos consecutivos.
    pub fn mul_ratio(&self, num: &BigInt, den: &BigInt) -> Result<Self, ComputeError> {
        if den.is_zero() {
            return Err(ComputeError::DivisionByZero);
        }
        Ok(Self {
            value: (&self.value * num) / den,
            scale: self.scale,
        })
    }

    /// Multiplica por un entero (exacto)
    pub fn mul_integer(&self, n: &BigInt) -> Self {
        Self { value: &self.value * n, scale: self.scale }
    }

    /// Producto en punto fijo, truncado a la escala de `self`
    pub fn mul(&self, other: &Fixed) -> Self {
        Self {
            value: (&self.value * &other.value) / pow10(other.scale),
            scale: self.scale,
        }
    }

    /// Cociente en punto fijo, truncado a la escala de `self`
    pub fn div(&self, other: &Fixed) -> Result<Self, ComputeError> {
        if other.value.is_zero() {
            return Err(ComputeError::DivisionByZero);
        }
        Ok(Self {
            value: (&self.value * pow10(other.scale)) / &other.value,
            scale: self.scale,
        })
    }

    /// Raíz cuadrada entera (truncada) a la misma escala
    pub fn sqrt(&self) -> Result<Self, ComputeError> {
        if self.value.is_negative() {
            return Err(ComputeError::NegativeSqrt);
        }
        // sqrt(v / 10^s) * 10^s = sqrt(v * 10^s)
        let widened = &self.value * pow10(self.scale);
        Ok(Self { value: widened.sqrt(), scale: self.scale })
    }

    /// Redondea a `digits` dígitos fraccionarios (half-up sobre el primer
    /// dígito descartado) y formatea como string decimal.
    pub fn round_to(&self, digits: u32) -> Result<String, ComputeError> {
        if digits > self.scale {
            return Err(ComputeError::DigitsExceedScale { digits, scale: self.scale });
        }

        let dropped = self.scale - digits;
        let magnitude = self.value.abs();
        let rounded = if dropped == 0 {
            magnitude
        } else {
            let half = pow10(dropped - 1) * BigInt::from(5u8);
            (magnitude + half) / pow10(dropped)
        };

        let mut text = rounded.to_string();
        let width = digits as usize + 1;
        if text.len() < width {
            text = format!("{}{}", "0".repeat(width - text.len()), text);
        }

        let split = text.len() - digits as usize;
        let sign = if self.value.sign() == Sign::Minus && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        if digits == 0 {
            Ok(format!("{}{}", sign, text))
        } else {
            Ok(format!("{}{}.{}", sign, &text[..split], &text[split..]))
        }
    }
}

impl AddAssign<&Fixed> for Fixed {
    fn add_assign(&mut self, other: &Fixed) {
        debug_assert_eq!(self.scale, other.scale);
        self.value += &other.value;
    }
}

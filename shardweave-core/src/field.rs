//! GF(2^8) arithmetic using exponent/log tables

use crate::constants::{EXP_TABLE_SIZE, FIELD_GENERATOR_POLY, FIELD_ORDER, FIELD_SIZE};
use crate::error::CodingError;
use std::sync::OnceLock;

/// The finite field GF(256) with generator polynomial `0x11D`
///
/// The exponent table is doubled so that `log[x] + log[y]` never needs a
/// modulo. Tables are immutable once built; share one instance with
/// [`GaloisField::shared`] or build your own with [`GaloisField::new`].
#[derive(Clone)]
pub struct GaloisField {
    exp: [u8; EXP_TABLE_SIZE],
    log: [u8; FIELD_SIZE],
}

impl GaloisField {
    /// Build the exponent and log tables
    pub fn new() -> Self {
        let mut exp = [0u8; EXP_TABLE_SIZE];
        let mut log = [0u8; FIELD_SIZE];

        let mut x: u16 = 1;
        exp[0] = 1;
        for i in 1..FIELD_ORDER {
            x <<= 1;
            if x & FIELD_SIZE as u16 != 0 {
                x ^= FIELD_GENERATOR_POLY;
            }
            exp[i] = x as u8;
            log[x as usize] = i as u8;
        }
        for i in FIELD_ORDER..EXP_TABLE_SIZE {
            exp[i] = exp[i - FIELD_ORDER];
        }

        Self { exp, log }
    }

    /// Process-wide field instance, built on first use
    pub fn shared() -> &'static GaloisField {
        static FIELD: OnceLock<GaloisField> = OnceLock::new();
        FIELD.get_or_init(GaloisField::new)
    }

    /// Number of field elements
    pub const fn size(&self) -> usize {
        FIELD_SIZE
    }

    /// `α^i` where `α = 2`
    ///
    /// # Panics
    /// If `i >= 512`. Every index the codec produces stays below that.
    #[inline]
    pub fn power(&self, i: usize) -> u8 {
        self.exp[i]
    }

    /// Discrete log of a nonzero element
    #[inline]
    pub fn log(&self, x: u8) -> usize {
        self.log[x as usize] as usize
    }

    /// Field multiplication
    #[inline]
    pub fn multiply(&self, x: u8, y: u8) -> u8 {
        if x == 0 || y == 0 {
            return 0;
        }
        self.exp[self.log(x) + self.log(y)]
    }

    /// Field division
    #[inline]
    pub fn divide(&self, x: u8, y: u8) -> Result<u8, CodingError> {
        if y == 0 {
            return Err(CodingError::DivideByZero);
        }
        if x == 0 {
            return Ok(0);
        }
        Ok(self.exp[self.log(x) + FIELD_ORDER - self.log(y)])
    }
}

impl Default for GaloisField {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GaloisField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaloisField")
            .field("size", &FIELD_SIZE)
            .field("generator", &format_args!("{:#x}", FIELD_GENERATOR_POLY))
            .finish()
    }
}

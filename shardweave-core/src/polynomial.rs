//! Immutable polynomials over GF(256)
//!
//! Coefficients are stored most-significant first, so `[1, 0, 3]` is
//! `x^2 + 3`. The order of a polynomial is its coefficient count. Every
//! operation allocates a new polynomial; nothing mutates in place.

use crate::constants::MAX_POLYNOMIAL_ORDER;
use crate::error::CodingError;
use crate::field::GaloisField;

/// Polynomial over a borrowed field
#[derive(Clone)]
pub struct Polynomial<'f> {
    coefficients: Vec<u8>,
    field: &'f GaloisField,
}

impl<'f> Polynomial<'f> {
    /// Create a polynomial, most-significant coefficient first
    pub fn new(field: &'f GaloisField, coefficients: Vec<u8>) -> Result<Self, CodingError> {
        if coefficients.len() > MAX_POLYNOMIAL_ORDER {
            return Err(CodingError::InvalidPolynomial {
                order: coefficients.len(),
                max: MAX_POLYNOMIAL_ORDER,
            });
        }
        Ok(Self {
            coefficients,
            field,
        })
    }

    /// The constant polynomial `1`
    pub fn one(field: &'f GaloisField) -> Self {
        Self {
            coefficients: vec![1],
            field,
        }
    }

    /// Coefficient count
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// Coefficients, most-significant first
    pub fn coefficients(&self) -> &[u8] {
        &self.coefficients
    }

    /// Field this polynomial is defined over
    pub fn field(&self) -> &'f GaloisField {
        self.field
    }

    /// Evaluate at `x` with Horner's method
    pub fn evaluate(&self, x: u8) -> u8 {
        horner(self.field, &self.coefficients, x)
    }

    /// Multiply every coefficient by `s`
    pub fn scale(&self, s: u8) -> Self {
        let coefficients = self
            .coefficients
            .iter()
            .map(|&c| self.field.multiply(s, c))
            .collect();
        Self {
            coefficients,
            field: self.field,
        }
    }

    /// Sum of two polynomials, aligned at the constant term
    pub fn add(&self, other: &Polynomial<'_>) -> Self {
        let order = self.order().max(other.order());
        let mut res = vec![0u8; order];
        for (r, &c) in res[order - self.order()..]
            .iter_mut()
            .zip(&self.coefficients)
        {
            *r = c;
        }
        for (r, &c) in res[order - other.order()..]
            .iter_mut()
            .zip(&other.coefficients)
        {
            *r ^= c;
        }
        Self {
            coefficients: res,
            field: self.field,
        }
    }

    /// Product of two polynomials
    pub fn multiply(&self, other: &Polynomial<'_>) -> Result<Self, CodingError> {
        Self::new(
            self.field,
            convolve(self.field, &self.coefficients, &other.coefficients),
        )
    }

    /// Shift left by one and set the new constant term to `x`
    pub fn append(&self, x: u8) -> Result<Self, CodingError> {
        let mut coefficients = Vec::with_capacity(self.order() + 1);
        coefficients.extend_from_slice(&self.coefficients);
        coefficients.push(x);
        Self::new(self.field, coefficients)
    }
}

impl PartialEq for Polynomial<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.coefficients == other.coefficients
    }
}

impl Eq for Polynomial<'_> {}

impl std::fmt::Debug for Polynomial<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Polynomial")
            .field(&self.coefficients)
            .finish()
    }
}

/// Horner evaluation over a raw coefficient slice
pub(crate) fn horner(field: &GaloisField, coefficients: &[u8], x: u8) -> u8 {
    coefficients
        .iter()
        .fold(0u8, |y, &c| field.multiply(y, x) ^ c)
}

/// Full convolution of two coefficient slices, without an order limit
pub(crate) fn convolve(field: &GaloisField, a: &[u8], b: &[u8]) -> Vec<u8> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut res = vec![0u8; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            res[i + j] ^= field.multiply(x, y);
        }
    }
    res
}

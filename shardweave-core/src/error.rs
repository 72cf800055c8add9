//! Error types for Shardweave operations


/// Errors that can occur while splitting or recombining a blob
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodingError {
    /// Division by the zero field element
    #[error("Division by zero in GF(256)")]
    DivideByZero,

    /// Polynomial order exceeds the field size
    #[error("Polynomial order {order} exceeds field size {max}")]
    InvalidPolynomial {
        /// Requested order (number of coefficients).
        order: usize,
        /// Largest order the field supports.
        max: usize,
    },

    /// `(k, t)` does not produce a whole number of symbols per fragment
    #[error("Bad alignment of bytes in chunking for k={k}, t={t}")]
    MisalignedGeometry {
        /// Original fragment count.
        k: usize,
        /// Allowed failures.
        t: usize,
    },

    /// More corruption than the parity can resolve
    #[error("Too many errors to correct: {errors} (capacity {capacity})")]
    TooManyErrors {
        /// Errors (or erasures) reported by the locator.
        errors: usize,
        /// Maximum the parity budget can handle.
        capacity: usize,
    },

    /// Root search did not find the expected number of error positions
    #[error("Could not locate error positions: found {found}, expected {expected}")]
    ErrorLocatingFailed {
        /// Positions found by the root search.
        found: usize,
        /// Errors implied by the locator polynomial.
        expected: usize,
    },

    /// Fragment set does not match the coding geometry
    #[error("Invalid fragments: {0}")]
    InvalidFragments(String),

    /// Read past the end of a byte buffer
    #[error("Truncated input: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes the read needed.
        expected: usize,
        /// Bytes that were left.
        actual: usize,
    },

    /// Malformed worker boundary message
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

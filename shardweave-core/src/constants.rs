//! Constants and limits for the Shardweave coding scheme

/// Number of elements in the symbol field: one byte per symbol, GF(2^8)
pub const FIELD_SIZE: usize = 256;

/// Field generator polynomial p(x) = x^8 + x^4 + x^3 + x^2 + 1
///
/// Bit 8 is the x^8 term; the low byte (0x1D) is what gets folded back
/// into the register when the shift overflows.
pub const FIELD_GENERATOR_POLY: u16 = 0x11D;

/// Order of the multiplicative group (the exponent table repeats after this)
pub const FIELD_ORDER: usize = FIELD_SIZE - 1;

/// Length of the doubled exponent table (avoids a modulo on every multiply)
pub const EXP_TABLE_SIZE: usize = 2 * FIELD_SIZE;

/// Maximum polynomial order (number of coefficients)
pub const MAX_POLYNOMIAL_ORDER: usize = FIELD_SIZE;

/// Maximum number of fragments a blob can be split into
pub const MAX_FRAGMENTS: usize = FIELD_SIZE;

/// Framing marker prefixed to fragment buffers that cross the worker boundary
pub const FRAGMENT_MARKER: u8 = 0xEC;

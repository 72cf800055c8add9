//! # Shardweave Core
//!
//! Reed-Solomon erasure coding over GF(256). A blob is split into
//! `n = k + 2t` fragments; the blob can be rebuilt while up to `t` of them are
//! corrupted at unknown positions, or up to `2t` are known to be missing.
//!
//! ## Modules
//!
//! - `constants`: Field and framing constants
//! - `field`: GF(256) arithmetic
//! - `cursor`: Byte writer/reader with big-endian framing
//! - `polynomial`: Immutable polynomials over the field
//! - `codec`: Reed-Solomon encode, syndromes, error location and correction
//! - `geometry`: `(k, t)` parameters and derived block sizes
//! - `splitter`: Blob to fragments
//! - `recombiner`: Fragments to blob
//! - `worker`: Message protocol for running the coder on a background worker
//!
//! ```
//! use shardweave_core::{recombine, split, CodingParams};
//!
//! let params = CodingParams::new(4, 1);
//! let data = b"any bytes at all".to_vec();
//! let mut fragments = split(&data, params).unwrap();
//! fragments[3] = bytes::Bytes::from(vec![0u8; fragments[3].len()]);
//! assert_eq!(&recombine(&fragments, data.len(), params).unwrap()[..], &data[..]);
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod field;
pub mod geometry;
pub mod polynomial;
pub mod recombiner;
pub mod splitter;
pub mod worker;

// Re-export commonly used types
pub use codec::Codec;
pub use error::CodingError;
pub use field::GaloisField;
pub use geometry::{CodingParams, Geometry};
pub use polynomial::Polynomial;
pub use recombiner::{recombine, recombine_with_erasures, Recombiner};
pub use splitter::{split, Splitter};

/// Result type alias for Shardweave operations
pub type Result<T> = std::result::Result<T, CodingError>;

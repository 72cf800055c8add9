//! Coding parameters and the block geometry derived from them

use crate::constants::{FIELD_SIZE, MAX_FRAGMENTS};
use crate::error::CodingError;
use serde::{Deserialize, Serialize};

/// Caller-chosen `(k, t)` pair
///
/// Field names follow the worker protocol (`originalBlocks`, `extraBlocks`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodingParams {
    /// `k`: fragments that carry the original data
    #[serde(rename = "originalBlocks")]
    pub original_fragments: usize,

    /// `t`: fragments that may be lost or corrupted; adds `2t` parity fragments
    #[serde(rename = "extraBlocks")]
    pub allowed_failures: usize,
}

impl CodingParams {
    /// Create parameters for `k` data fragments tolerating `t` failures
    pub const fn new(original_fragments: usize, allowed_failures: usize) -> Self {
        Self {
            original_fragments,
            allowed_failures,
        }
    }

    /// Derive and validate the geometry
    pub fn geometry(&self) -> Result<Geometry, CodingError> {
        Geometry::new(*self)
    }
}

/// Sizes derived from [`CodingParams`]
///
/// One input block of `input_block_size` bytes encodes to a codeword of
/// `codeword_size` bytes, which is cut into `total_fragments` symbols of
/// `symbol_size` bytes each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// `k`
    pub original_fragments: usize,
    /// `n = k + 2t`
    pub total_fragments: usize,
    /// Largest multiple of `n` not exceeding the field size
    pub codeword_size: usize,
    /// Data bytes per codeword
    pub input_block_size: usize,
    /// Parity bytes per codeword
    pub parity: usize,
    /// Bytes each fragment receives per codeword
    pub symbol_size: usize,
}

impl Geometry {
    /// Derive the geometry, rejecting pairs that do not align to whole symbols
    pub fn new(params: CodingParams) -> Result<Self, CodingError> {
        let k = params.original_fragments;
        let t = params.allowed_failures;
        let misaligned = CodingError::MisalignedGeometry { k, t };

        let n = t
            .checked_mul(2)
            .and_then(|p| p.checked_add(k))
            .ok_or_else(|| misaligned.clone())?;
        if k == 0 || n > MAX_FRAGMENTS {
            return Err(misaligned);
        }

        let codeword_size = (FIELD_SIZE / n) * n;
        let input_block_size = codeword_size * k / n;
        let parity = codeword_size - input_block_size;
        let symbol_size = input_block_size / k;
        if symbol_size == 0 || symbol_size * k != input_block_size {
            return Err(misaligned);
        }

        Ok(Self {
            original_fragments: k,
            total_fragments: n,
            codeword_size,
            input_block_size,
            parity,
            symbol_size,
        })
    }

    /// Parity fragments, `2t`
    pub fn parity_fragments(&self) -> usize {
        self.total_fragments - self.original_fragments
    }

    /// Codewords needed for `len` input bytes (last block zero-padded)
    pub fn blocks_for(&self, len: usize) -> usize {
        len.div_ceil(self.input_block_size)
    }

    /// Length of every fragment produced from `len` input bytes
    pub fn fragment_len(&self, len: usize) -> usize {
        self.blocks_for(len) * self.symbol_size
    }

    /// True when the codeword fills the whole field (`n` divides 256)
    ///
    /// The first and last codeword bytes then share the locator `α^0`, so
    /// damage to fragment 0 or fragment `n - 1` may not be located, and those
    /// two fragments cannot both be missing. Every other fragment keeps the
    /// full `t` corrupted or `2t` missing budget.
    pub fn aliased_ends(&self) -> bool {
        self.codeword_size == FIELD_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_k4_t1() {
        let g = Geometry::new(CodingParams::new(4, 1)).unwrap();
        assert_eq!(g.total_fragments, 6);
        assert_eq!(g.codeword_size, 252);
        assert_eq!(g.input_block_size, 168);
        assert_eq!(g.parity, 84);
        assert_eq!(g.symbol_size, 42);
        assert_eq!(g.parity_fragments(), 2);
    }

    #[test]
    fn test_geometry_full_field() {
        let g = Geometry::new(CodingParams::new(2, 1)).unwrap();
        assert_eq!(g.codeword_size, 256);
        assert_eq!(g.symbol_size, 64);
        assert!(g.aliased_ends());

        for (k, t) in [(4, 2), (6, 1), (12, 2)] {
            assert!(Geometry::new(CodingParams::new(k, t)).unwrap().aliased_ends());
        }
        for (k, t) in [(4, 1), (3, 2), (1, 1)] {
            assert!(!Geometry::new(CodingParams::new(k, t)).unwrap().aliased_ends());
        }
    }

    #[test]
    fn test_geometry_no_parity() {
        let g = Geometry::new(CodingParams::new(5, 0)).unwrap();
        assert_eq!(g.parity, 0);
        assert_eq!(g.input_block_size, 255);
    }

    #[test]
    fn test_fragment_len() {
        let g = Geometry::new(CodingParams::new(4, 1)).unwrap();
        assert_eq!(g.fragment_len(0), 0);
        assert_eq!(g.fragment_len(1), 42);
        assert_eq!(g.fragment_len(168), 42);
        assert_eq!(g.fragment_len(169), 84);
        assert_eq!(g.fragment_len(1024), 7 * 42);
    }

    #[test]
    fn test_rejects_bad_pairs() {
        for (k, t) in [(0, 1), (0, 0), (200, 30), (1, 200), (1, usize::MAX)] {
            assert_eq!(
                Geometry::new(CodingParams::new(k, t)),
                Err(CodingError::MisalignedGeometry { k, t }),
                "k={} t={}",
                k,
                t
            );
        }
    }

    #[test]
    fn test_params_serde_names() {
        let json = serde_json::to_string(&CodingParams::new(3, 2)).unwrap();
        assert_eq!(json, r#"{"originalBlocks":3,"extraBlocks":2}"#);
    }
}

//! Reassembling a blob from its fragments

use crate::codec::Codec;
use crate::cursor::ByteWriter;
use crate::error::CodingError;
use crate::geometry::{CodingParams, Geometry};
use bytes::Bytes;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Decodes fragment sets produced by a [`crate::splitter::Splitter`] with the same parameters
#[derive(Debug)]
pub struct Recombiner<'c, 'f> {
    codec: &'c Codec<'f>,
    geometry: Geometry,
}

impl<'c, 'f> Recombiner<'c, 'f> {
    /// Create a recombiner, validating `params`
    pub fn new(codec: &'c Codec<'f>, params: CodingParams) -> Result<Self, CodingError> {
        Ok(Self {
            codec,
            geometry: Geometry::new(params)?,
        })
    }

    /// Geometry in use
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Rebuild the original blob from all `n` fragments in canonical order
    ///
    /// Corrupted fragments (including zero-filled placeholders) are located
    /// and corrected per codeword; up to `t` of them are recoverable. When
    /// [`Geometry::aliased_ends`] holds, damage to the first or last fragment
    /// may not be recoverable. The result is truncated to `original_len`.
    pub fn recombine(&self, fragments: &[Bytes], original_len: usize) -> Result<Bytes, CodingError> {
        let g = &self.geometry;
        if fragments.len() != g.total_fragments {
            return Err(CodingError::InvalidFragments(format!(
                "expected {} fragments, got {}",
                g.total_fragments,
                fragments.len()
            )));
        }
        let fragment_len = self.common_len(fragments.iter().map(|f| f.len()))?;

        let mut out = ByteWriter::with_capacity(fragment_len / g.symbol_size * g.input_block_size);
        let mut codeword = ByteWriter::with_capacity(g.codeword_size);
        let mut corrected = 0usize;

        for offset in (0..fragment_len).step_by(g.symbol_size) {
            for fragment in fragments {
                codeword.write(&fragment[offset..offset + g.symbol_size]);
            }
            corrected += self
                .codec
                .decode_in_place(codeword.as_mut_slice(), g.parity)?;
            out.write(&codeword.as_slice()[..g.input_block_size]);
            codeword.reset();
        }

        self.finish(out, original_len, corrected)
    }

    /// Rebuild the original blob when some fragments are known to be missing
    ///
    /// `None` marks a fragment whose position is known but whose content is
    /// gone. Its symbols are treated as erasures, so up to `2t` missing
    /// fragments are recoverable, or fewer missing alongside silently
    /// corrupted ones. When [`Geometry::aliased_ends`] holds, the first and
    /// last fragments must not both be missing.
    pub fn recombine_with_erasures(
        &self,
        fragments: &[Option<Bytes>],
        original_len: usize,
    ) -> Result<Bytes, CodingError> {
        let g = &self.geometry;
        if fragments.len() != g.total_fragments {
            return Err(CodingError::InvalidFragments(format!(
                "expected {} fragment slots, got {}",
                g.total_fragments,
                fragments.len()
            )));
        }
        if fragments.iter().all(Option::is_none) {
            return Err(CodingError::InvalidFragments(
                "no fragments present".into(),
            ));
        }
        let fragment_len = self.common_len(fragments.iter().flatten().map(|f| f.len()))?;

        let missing: Vec<usize> = fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_none())
            .map(|(j, _)| j)
            .collect();
        let erasures: Vec<usize> = missing
            .iter()
            .flat_map(|&j| j * g.symbol_size..(j + 1) * g.symbol_size)
            .collect();
        if erasures.len() > g.parity {
            return Err(CodingError::TooManyErrors {
                errors: erasures.len(),
                capacity: g.parity,
            });
        }

        #[cfg(feature = "logging")]
        if !missing.is_empty() {
            debug!("Recombining with missing fragments {:?}", missing);
        }

        let placeholder = vec![0u8; g.symbol_size];
        let mut out = ByteWriter::with_capacity(fragment_len / g.symbol_size * g.input_block_size);
        let mut codeword = ByteWriter::with_capacity(g.codeword_size);
        let mut corrected = 0usize;

        for offset in (0..fragment_len).step_by(g.symbol_size) {
            for fragment in fragments {
                match fragment {
                    Some(f) => codeword.write(&f[offset..offset + g.symbol_size]),
                    None => codeword.write(&placeholder),
                }
            }
            corrected += self.codec.decode_with_erasures(
                codeword.as_mut_slice(),
                g.parity,
                &erasures,
            )?;
            out.write(&codeword.as_slice()[..g.input_block_size]);
            codeword.reset();
        }

        self.finish(out, original_len, corrected)
    }

    fn common_len(&self, mut lens: impl Iterator<Item = usize>) -> Result<usize, CodingError> {
        let first = lens.next().unwrap_or(0);
        if lens.any(|l| l != first) {
            return Err(CodingError::InvalidFragments(
                "fragments differ in length".into(),
            ));
        }
        if first % self.geometry.symbol_size != 0 {
            return Err(CodingError::InvalidFragments(format!(
                "fragment length {} is not a multiple of symbol size {}",
                first, self.geometry.symbol_size
            )));
        }
        Ok(first)
    }

    fn finish(&self, out: ByteWriter, original_len: usize, corrected: usize) -> Result<Bytes, CodingError> {
        if original_len > out.len() {
            return Err(CodingError::InvalidFragments(format!(
                "original length {} exceeds decoded length {}",
                original_len,
                out.len()
            )));
        }

        #[cfg(feature = "logging")]
        if corrected > 0 {
            warn!("Recombined {} bytes after correcting {} symbols", original_len, corrected);
        } else {
            debug!("Recombined {} bytes, no corrections needed", original_len);
        }
        #[cfg(not(feature = "logging"))]
        let _ = corrected;

        let mut bytes = out.into_bytes();
        bytes.truncate(original_len);
        Ok(bytes)
    }
}

/// Recombine all `n` fragments with the process-wide codec
pub fn recombine(
    fragments: &[Bytes],
    original_len: usize,
    params: CodingParams,
) -> Result<Bytes, CodingError> {
    Recombiner::new(Codec::shared(), params)?.recombine(fragments, original_len)
}

/// Recombine with known-missing fragments using the process-wide codec
pub fn recombine_with_erasures(
    fragments: &[Option<Bytes>],
    original_len: usize,
    params: CodingParams,
) -> Result<Bytes, CodingError> {
    Recombiner::new(Codec::shared(), params)?.recombine_with_erasures(fragments, original_len)
}

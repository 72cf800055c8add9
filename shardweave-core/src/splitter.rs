//! Splitting a blob into erasure-coded fragments

use crate::codec::Codec;
use crate::cursor::ByteWriter;
use crate::error::CodingError;
use crate::geometry::{CodingParams, Geometry};
use bytes::Bytes;

#[cfg(feature = "logging")]
use tracing::debug;

/// Encodes blobs into `n = k + 2t` fragments with a fixed geometry
#[derive(Debug)]
pub struct Splitter<'c, 'f> {
    codec: &'c Codec<'f>,
    geometry: Geometry,
}

impl<'c, 'f> Splitter<'c, 'f> {
    /// Create a splitter, validating `params`
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

    /// Split `data` into `n` equal-length fragments
    ///
    /// Each `input_block_size` slice is encoded into one codeword; fragment
    /// `j` receives codeword bytes `j*symbol_size .. (j+1)*symbol_size`. A
    /// short trailing slice is zero-padded to a full block, so every fragment
    /// is `ceil(len / input_block_size) * symbol_size` bytes long.
    pub fn split(&self, data: &[u8]) -> Result<Vec<Bytes>, CodingError> {
        let g = &self.geometry;
        let fragment_len = g.fragment_len(data.len());

        #[cfg(feature = "logging")]
        debug!(
            "Splitting {} bytes into {} fragments of {} bytes ({} blocks)",
            data.len(),
            g.total_fragments,
            fragment_len,
            g.blocks_for(data.len())
        );

        let mut outs: Vec<ByteWriter> = (0..g.total_fragments)
            .map(|_| ByteWriter::with_capacity(fragment_len))
            .collect();
        let mut padded = vec![0u8; g.input_block_size];

        for chunk in data.chunks(g.input_block_size) {
            let block: &[u8] = if chunk.len() == g.input_block_size {
                chunk
            } else {
                padded.fill(0);
                padded[..chunk.len()].copy_from_slice(chunk);
                &padded
            };

            let codeword = self.codec.systematic_encode(block, g.parity)?;
            for (out, symbol) in outs.iter_mut().zip(codeword.chunks_exact(g.symbol_size)) {
                out.write(symbol);
            }
        }

        Ok(outs.into_iter().map(ByteWriter::into_bytes).collect())
    }
}

/// Split `data` with the process-wide codec
pub fn split(data: &[u8], params: CodingParams) -> Result<Vec<Bytes>, CodingError> {
    Splitter::new(Codec::shared(), params)?.split(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_count_and_length() {
        let data = vec![1u8; 1000];
        let frags = split(&data, CodingParams::new(4, 1)).unwrap();
        assert_eq!(frags.len(), 6);
        for f in &frags {
            assert_eq!(f.len(), 6 * 42);
        }
    }

    #[test]
    fn test_data_fragments_are_systematic() {
        let data: Vec<u8> = (0..168u32).map(|i| i as u8).collect();
        let frags = split(&data, CodingParams::new(4, 1)).unwrap();
        for j in 0..4 {
            assert_eq!(&frags[j][..], &data[j * 42..(j + 1) * 42]);
        }
    }

    #[test]
    fn test_short_block_is_zero_padded() {
        let params = CodingParams::new(3, 2);
        let short = b"tail";
        let mut padded = short.to_vec();
        padded.resize(params.geometry().unwrap().input_block_size, 0);

        assert_eq!(split(short, params).unwrap(), split(&padded, params).unwrap());
    }

    #[test]
    fn test_empty_input() {
        let frags = split(&[], CodingParams::new(4, 1)).unwrap();
        assert_eq!(frags.len(), 6);
        assert!(frags.iter().all(|f| f.is_empty()));
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            split(b"x", CodingParams::new(0, 3)),
            Err(CodingError::MisalignedGeometry { k: 0, t: 3 })
        ));
    }

    #[test]
    fn test_split_is_deterministic() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i * 31 % 251) as u8).collect();
        let a = split(&data, CodingParams::new(5, 2)).unwrap();
        let b = split(&data, CodingParams::new(5, 2)).unwrap();
        assert_eq!(a, b);
    }
}

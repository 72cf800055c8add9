//! Fuzzing entry points for shardweave-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_recombine

use bytes::Bytes;
use shardweave_core::codec::Codec;
use shardweave_core::worker::{ErasureWorker, Request};
use shardweave_core::{recombine, recombine_with_erasures, CodingParams};

/// Decode arbitrary bytes as a codeword with a parity length taken from the first byte
pub fn fuzz_decode(data: &[u8]) {
    let Some((&nsym, rest)) = data.split_first() else {
        return;
    };
    let mut buf = rest.to_vec();
    // Must never panic
    let _ = Codec::shared().decode_in_place(&mut buf, nsym as usize);
}

/// Recombine arbitrary bytes cut into fragments
///
/// The first two bytes pick `k` and `t`, the third marks which fragments are
/// missing, and the rest is dealt round-robin into the fragments.
pub fn fuzz_recombine(data: &[u8]) {
    if data.len() < 3 {
        return;
    }
    let params = CodingParams::new((data[0] % 16) as usize, (data[1] % 8) as usize);
    let Ok(g) = params.geometry() else {
        return;
    };
    let mask = data[2];
    let body = &data[3..];

    let mut fragments = vec![Vec::new(); g.total_fragments];
    for (i, &b) in body.iter().enumerate() {
        fragments[i % g.total_fragments].push(b);
    }
    let fragments: Vec<Bytes> = fragments.into_iter().map(Bytes::from).collect();

    let _ = recombine(&fragments, body.len(), params);

    let with_gaps: Vec<Option<Bytes>> = fragments
        .into_iter()
        .enumerate()
        .map(|(i, f)| (mask & (1 << (i % 8)) == 0).then_some(f))
        .collect();
    let _ = recombine_with_erasures(&with_gaps, body.len(), params);
}

/// Feed a JSON request stream to a worker, one request per line
pub fn fuzz_worker(data: &[u8]) {
    let mut worker = ErasureWorker::new(Codec::shared());
    for line in data.split(|&b| b == b'\n') {
        if let Ok(request) = serde_json::from_slice::<Request>(line) {
            let _ = worker.handle(request);
        }
    }
}

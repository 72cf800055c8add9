use anyhow::{Context, Result};
use serde::Serialize;
use shardweave_core::CodingParams;

/// Geometry summary printed by `inspect`
#[derive(Debug, Serialize)]
pub struct Inspection {
    pub original_fragments: usize,
    pub allowed_failures: usize,
    pub total_fragments: usize,
    pub codeword_size: usize,
    pub input_block_size: usize,
    pub parity: usize,
    pub symbol_size: usize,
    /// Fragments 0 and `n - 1` share codeword positions
    pub aliased_ends: bool,
    /// Bytes each fragment holds for an input of `size` bytes, if given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_len: Option<usize>,
}

pub fn inspect(k: usize, t: usize, size: Option<usize>) -> Result<Inspection> {
    let g = CodingParams::new(k, t)
        .geometry()
        .with_context(|| format!("Unusable parameters k={}, t={}", k, t))?;
    Ok(Inspection {
        original_fragments: g.original_fragments,
        allowed_failures: t,
        total_fragments: g.total_fragments,
        codeword_size: g.codeword_size,
        input_block_size: g.input_block_size,
        parity: g.parity,
        symbol_size: g.symbol_size,
        aliased_ends: g.aliased_ends(),
        fragment_len: size.map(|s| g.fragment_len(s)),
    })
}

pub fn execute(k: usize, t: usize, size: Option<usize>, json: bool) -> Result<()> {
    let info = inspect(k, t, size)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Geometry for k={}, t={}", k, t);
    println!("  Total fragments:  {}", info.total_fragments);
    println!("  Codeword size:    {}", info.codeword_size);
    println!("  Input block size: {}", info.input_block_size);
    println!("  Parity bytes:     {}", info.parity);
    println!("  Symbol size:      {}", info.symbol_size);
    if info.aliased_ends {
        println!(
            "  Note: fragments 0 and {} share codeword positions; damage to them may be unrecoverable",
            info.total_fragments - 1
        );
    }
    if let Some(len) = info.fragment_len {
        println!("  Fragment length:  {}", len);
    }

    Ok(())
}

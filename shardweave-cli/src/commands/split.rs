use anyhow::{Context, Result};
use colored::Colorize;
use shardweave_core::{split, CodingParams, Geometry};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::fragment_file::FragmentFile;
use crate::manifest::{fragment_file_name, FragmentEntry, Manifest, MANIFEST_FILE};

pub fn execute(input: &str, output_dir: &str, k: usize, t: usize) -> Result<()> {
    info!("Splitting {} into {} (k={}, t={})", input, output_dir, k, t);

    let data = fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?;

    let params = CodingParams::new(k, t);
    let geometry = params
        .geometry()
        .with_context(|| format!("Unusable parameters k={}, t={}", k, t))?;
    if geometry.aliased_ends() {
        warn!(
            "n={} divides 256: fragments 0 and {} share codeword positions, damage to them may be unrecoverable",
            geometry.total_fragments,
            geometry.total_fragments - 1
        );
    }
    let fragments = split(&data, params)
        .with_context(|| format!("Failed to split {} with k={}, t={}", input, k, t))?;

    let out = Path::new(output_dir);
    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory: {}", output_dir))?;

    let total = fragments.len();
    let mut entries = Vec::with_capacity(total);
    for (index, payload) in fragments.into_iter().enumerate() {
        let file = fragment_file_name(index);
        let crc = crc32c::crc32c(&payload);
        let encoded = FragmentFile {
            index: index as u32,
            total: total as u32,
            payload,
        }
        .encode();

        let path = out.join(&file);
        fs::write(&path, &encoded)
            .with_context(|| format!("Failed to write fragment: {}", path.display()))?;
        info!("Wrote fragment {} ({} bytes)", index, encoded.len());

        entries.push(FragmentEntry {
            index,
            file,
            crc32c: crc,
        });
    }

    let file_name = Path::new(input)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string());

    let manifest = Manifest {
        file_name,
        file_size: data.len(),
        params,
        total_fragments: total,
        blake3: hex::encode(blake3::hash(&data).as_bytes()),
        fragments: entries,
    };
    manifest.save(&out.join(MANIFEST_FILE))?;

    println!(
        "{} Split {} bytes into {} fragments ({} data + {} parity)",
        "✓".green(),
        data.len(),
        total,
        k,
        total - k
    );
    println!("  {}", tolerance(&geometry));

    Ok(())
}

/// Human-readable fault budget for a geometry
pub fn tolerance(geometry: &Geometry) -> String {
    let t = geometry.parity_fragments() / 2;
    if geometry.aliased_ends() {
        format!(
            "Survives {} corrupted or {} missing fragments; damage to fragment 0 or {} may be unrecoverable",
            t,
            2 * t,
            geometry.total_fragments - 1
        )
    } else {
        format!("Survives {} corrupted or {} missing fragments", t, 2 * t)
    }
}

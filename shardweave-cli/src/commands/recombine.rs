use anyhow::{bail, Context, Result};
use bytes::Bytes;
use colored::Colorize;
use shardweave_core::recombine_with_erasures;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::fragment_file::FragmentFile;
use crate::manifest::{FragmentEntry, Manifest};

pub fn execute(manifest_path: &str, output: &str) -> Result<()> {
    info!("Recombining from {} to {}", manifest_path, output);

    let manifest_path = Path::new(manifest_path);
    let manifest = Manifest::load(manifest_path)?;
    let dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    if manifest.fragments.len() != manifest.total_fragments {
        bail!(
            "Manifest lists {} fragments but expects {}",
            manifest.fragments.len(),
            manifest.total_fragments
        );
    }

    let mut fragments = vec![None; manifest.total_fragments];
    for entry in &manifest.fragments {
        if entry.index >= manifest.total_fragments {
            bail!("Manifest entry {} is out of range", entry.index);
        }
        let path = entry.path_in(dir)?;
        fragments[entry.index] = load_fragment(&path, entry, manifest.total_fragments);
    }

    let missing = fragments.iter().filter(|f| f.is_none()).count();
    if missing > 0 {
        warn!(
            "{} of {} fragments missing or damaged; treating them as erasures",
            missing, manifest.total_fragments
        );
    }

    let data = recombine_with_erasures(&fragments, manifest.file_size, manifest.params)
        .with_context(|| format!("Failed to recombine {}", manifest.file_name))?;

    let hash = hex::encode(blake3::hash(&data).as_bytes());
    if hash != manifest.blake3 {
        println!("{} BLAKE3 mismatch for {}", "✗".red(), manifest.file_name);
        bail!(
            "Recombined data does not match the manifest hash (expected {}, got {})",
            manifest.blake3,
            hash
        );
    }

    fs::write(output, &data).with_context(|| format!("Failed to write output file: {}", output))?;

    println!(
        "{} Recovered {} ({} bytes, {} erasures)",
        "✓".green(),
        manifest.file_name,
        data.len(),
        missing
    );

    Ok(())
}

/// Read a fragment file, returning `None` when it is unusable
fn load_fragment(path: &Path, entry: &FragmentEntry, total: usize) -> Option<Bytes> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Fragment {} unreadable ({}): {}", entry.index, path.display(), e);
            return None;
        }
    };
    let frag = match FragmentFile::decode(Bytes::from(raw)) {
        Ok(frag) => frag,
        Err(e) => {
            warn!("Fragment {} has a bad header: {}", entry.index, e);
            return None;
        }
    };
    if frag.index as usize != entry.index || frag.total as usize != total {
        warn!(
            "Fragment {} header claims position {}/{}",
            entry.index,
            frag.index,
            frag.total
        );
        return None;
    }
    if crc32c::crc32c(&frag.payload) != entry.crc32c {
        warn!("Fragment {} failed its CRC32C check", entry.index);
        return None;
    }
    Some(frag.payload)
}

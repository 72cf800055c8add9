//! Sidecar manifest written next to the fragment files

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use shardweave_core::CodingParams;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// File name of the manifest inside a fragment directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// One fragment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentEntry {
    /// Canonical position, 0-based
    pub index: usize,
    /// File name relative to the manifest
    pub file: String,
    /// CRC32C of the fragment payload
    pub crc32c: u32,
}

impl FragmentEntry {
    /// Location of the fragment file inside `dir`
    ///
    /// The manifest may only name files directly beside it.
    pub fn path_in(&self, dir: &Path) -> Result<PathBuf> {
        let mut components = Path::new(&self.file).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(dir.join(name)),
            _ => bail!(
                "Fragment {} file {:?} is not a plain file name",
                self.index,
                self.file
            ),
        }
    }
}

/// Everything needed to recombine a split file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Name of the original file
    pub file_name: String,
    /// Length of the original file
    pub file_size: usize,
    /// `(k, t)` used for the split
    #[serde(flatten)]
    pub params: CodingParams,
    /// `n`
    pub total_fragments: usize,
    /// BLAKE3 of the original file, hex
    pub blake3: String,
    /// Fragment files in canonical order
    pub fragments: Vec<FragmentEntry>,
}

impl Manifest {
    /// Load and parse a manifest
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    /// Write the manifest as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))
    }
}

/// Fragment file name for position `index`
pub fn fragment_file_name(index: usize) -> String {
    format!("fragment-{:03}.swf", index)
}

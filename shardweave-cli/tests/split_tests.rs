use std::fs;
use tempfile::tempdir;

use shardweave_cli::commands::{inspect, split};
use shardweave_cli::manifest::{fragment_file_name, Manifest, MANIFEST_FILE};
use shardweave_cli::FragmentFile;

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

#[test]
fn split_writes_fragments_and_manifest() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("blob.bin");
    let out_dir = td.path().join("frags");
    let data = sample(1000);
    fs::write(&in_path, &data).unwrap();

    split::execute(in_path.to_str().unwrap(), out_dir.to_str().unwrap(), 4, 1).unwrap();

    let manifest = Manifest::load(&out_dir.join(MANIFEST_FILE)).unwrap();
    assert_eq!(manifest.file_name, "blob.bin");
    assert_eq!(manifest.file_size, 1000);
    assert_eq!(manifest.total_fragments, 6);
    assert_eq!(manifest.fragments.len(), 6);
    assert_eq!(manifest.blake3, hex::encode(blake3::hash(&data).as_bytes()));

    // 1000 bytes over 168-byte blocks is 6 blocks of 42-byte symbols
    for (i, entry) in manifest.fragments.iter().enumerate() {
        assert_eq!(entry.index, i);
        assert_eq!(entry.file, fragment_file_name(i));
        let raw = fs::read(out_dir.join(&entry.file)).unwrap();
        let frag = FragmentFile::decode(raw.into()).unwrap();
        assert_eq!(frag.index as usize, i);
        assert_eq!(frag.total, 6);
        assert_eq!(frag.payload.len(), 6 * 42);
        assert_eq!(crc32c::crc32c(&frag.payload), entry.crc32c);
    }
}

#[test]
fn manifest_uses_worker_field_names() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("a.txt");
    let out_dir = td.path().join("out");
    fs::write(&in_path, b"short").unwrap();

    split::execute(in_path.to_str().unwrap(), out_dir.to_str().unwrap(), 3, 2).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join(MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(json["originalBlocks"], 3);
    assert_eq!(json["extraBlocks"], 2);
    assert_eq!(json["total_fragments"], 7);
}

#[test]
fn split_rejects_misaligned_params() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("a.bin");
    fs::write(&in_path, sample(10)).unwrap();

    let res = split::execute(
        in_path.to_str().unwrap(),
        td.path().join("o").to_str().unwrap(),
        0,
        1,
    );
    assert!(res.is_err());
}

#[test]
fn split_missing_input() {
    let td = tempdir().unwrap();
    let res = split::execute(
        td.path().join("nope").to_str().unwrap(),
        td.path().join("o").to_str().unwrap(),
        4,
        1,
    );
    let msg = format!("{:#}", res.unwrap_err());
    assert!(msg.contains("Failed to read input file"));
}

#[test]
fn inspect_reports_geometry() {
    let info = inspect::inspect(4, 1, Some(1000)).unwrap();
    assert_eq!(info.total_fragments, 6);
    assert_eq!(info.codeword_size, 252);
    assert_eq!(info.input_block_size, 168);
    assert_eq!(info.parity, 84);
    assert_eq!(info.symbol_size, 42);
    assert_eq!(info.fragment_len, Some(252));

    assert!(inspect::inspect(0, 1, None).is_err());
}

#[test]
fn split_reports_full_field_limitation() {
    use shardweave_core::CodingParams;

    let full = CodingParams::new(4, 2).geometry().unwrap();
    let msg = split::tolerance(&full);
    assert!(msg.starts_with("Survives 2 corrupted or 4 missing"));
    assert!(msg.contains("fragment 0 or 7 may be unrecoverable"));

    let regular = CodingParams::new(4, 1).geometry().unwrap();
    assert_eq!(
        split::tolerance(&regular),
        "Survives 1 corrupted or 2 missing fragments"
    );

    assert!(inspect::inspect(2, 1, None).unwrap().aliased_ends);
    assert!(!inspect::inspect(4, 1, None).unwrap().aliased_ends);
}

use rosterd::backup;
use rosterd::snapshot;
use rosterd::store::RosterState;

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn colored_seed() -> RosterState {
    let mut state = RosterState::seed();
    state
        .activity_colors
        .insert("Choir".to_string(), "#F59E0B".to_string());
    state
}

#[test]
fn zip_export_and_import_roundtrip() {
    let out_dir = temp_dir("rosterd-backup-out");
    let state = colored_seed();

    let bundle_path = out_dir.join("nested").join("roster.zip");
    let export = backup::export_bundle(&state, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 2);
    assert_eq!(export.snapshot_sha256.len(), 64);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    let manifest: serde_json::Value = serde_json::from_str(&manifest).expect("manifest json");
    assert_eq!(manifest["format"], serde_json::json!(backup::BUNDLE_FORMAT_V1));
    assert_eq!(manifest["snapshotSha256"], serde_json::json!(export.snapshot_sha256));
    assert!(manifest["exportedAt"].is_string());
    archive.by_name("snapshot.json").expect("snapshot entry");

    let import = backup::import_bundle(&bundle_path).expect("import bundle");
    assert_eq!(import.bundle_format_detected, backup::BUNDLE_FORMAT_V1);
    assert_eq!(import.snapshot.into_state(&RosterState::default()), state);

    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn tampered_snapshot_fails_checksum() {
    let out_dir = temp_dir("rosterd-backup-tamper");
    let bundle_path = out_dir.join("tampered.zip");
    let export = backup::export_bundle(&colored_seed(), &bundle_path).expect("export");

    let manifest = serde_json::json!({
        "format": backup::BUNDLE_FORMAT_V1,
        "version": 1,
        "snapshotSha256": export.snapshot_sha256,
    });
    let forged = out_dir.join("forged.zip");
    let mut zip = zip::ZipWriter::new(File::create(&forged).expect("create forged"));
    let opts = zip::write::FileOptions::default();
    zip.start_file("manifest.json", opts).expect("manifest entry");
    zip.write_all(manifest.to_string().as_bytes()).expect("write manifest");
    zip.start_file("snapshot.json", opts).expect("snapshot entry");
    zip.write_all(br#"{"students":[],"activities":[]}"#)
        .expect("write snapshot");
    zip.finish().expect("finish");

    let e = backup::import_bundle(&forged).unwrap_err();
    assert!(e.to_string().contains("checksum"));
    assert_eq!(backup::import_error_code(&e), "invalid_snapshot");

    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn bare_snapshot_json_is_accepted() {
    let out_dir = temp_dir("rosterd-backup-json");
    let path = out_dir.join("plain.json");
    let text = snapshot::serialize_pretty(&colored_seed()).expect("serialize");
    std::fs::write(&path, text).expect("write json");

    let import = backup::import_bundle(&path).expect("import json");
    assert_eq!(import.bundle_format_detected, "snapshot-json");
    assert_eq!(import.snapshot.students.len(), 3);

    let garbage = out_dir.join("garbage.json");
    std::fs::write(&garbage, "[1,2,3]").expect("write garbage");
    assert!(backup::import_bundle(&garbage).is_err());

    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn unreadable_input_is_an_io_failure() {
    let out_dir = temp_dir("rosterd-backup-io");

    let missing = out_dir.join("missing.zip");
    let e = backup::import_bundle(&missing).unwrap_err();
    assert_eq!(backup::import_error_code(&e), "io_failed");

    // Opening a directory succeeds on unix; reading from it does not.
    let dir = out_dir.join("not-a-file");
    std::fs::create_dir_all(&dir).expect("create dir");
    let e = backup::import_bundle(&dir).unwrap_err();
    assert_eq!(backup::import_error_code(&e), "io_failed");

    let garbage = out_dir.join("garbage.json");
    std::fs::write(&garbage, "{not json").expect("write garbage");
    let e = backup::import_bundle(&garbage).unwrap_err();
    assert_eq!(backup::import_error_code(&e), "invalid_snapshot");

    let _ = std::fs::remove_dir_all(out_dir);
}

use crate::error::RosterError;
use crate::snapshot::{self, AppSnapshot};
use crate::store::RosterState;
use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const SNAPSHOT_ENTRY: &str = "snapshot.json";
pub const BUNDLE_FORMAT_V1: &str = "roster-snapshot-bundle-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub snapshot_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub snapshot: AppSnapshot,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn export_bundle(state: &RosterState, out_path: &Path) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let snapshot_text =
        snapshot::serialize_pretty(state).map_err(|e| anyhow!("failed to serialize snapshot: {e}"))?;
    let checksum = sha256_hex(snapshot_text.as_bytes());

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "snapshotSha256": checksum,
        "studentCount": state.students.len(),
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(SNAPSHOT_ENTRY, opts)
        .context("failed to start snapshot entry")?;
    zip.write_all(snapshot_text.as_bytes())
        .context("failed to write snapshot entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
        snapshot_sha256: checksum,
    })
}

fn io_failed(what: &str, path: &Path, e: std::io::Error) -> anyhow::Error {
    anyhow::Error::new(RosterError::Io(format!(
        "failed to {} {}: {}",
        what,
        path.to_string_lossy(),
        e
    )))
}

/// Error code for a failed import: `io_failed` when the file could not be
/// read at all, `invalid_snapshot` for anything wrong with its contents.
pub fn import_error_code(e: &anyhow::Error) -> &'static str {
    let io = e
        .chain()
        .any(|c| matches!(c.downcast_ref::<RosterError>(), Some(RosterError::Io(_))));
    if io {
        "io_failed"
    } else {
        "invalid_snapshot"
    }
}

/// Reads a bundle (or a bare snapshot JSON file) and decodes the snapshot.
/// Nothing is applied here; the caller installs the result.
pub fn import_bundle(in_path: &Path) -> anyhow::Result<ImportSummary> {
    if !is_zip_file(in_path)? {
        let text = std::fs::read_to_string(in_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                anyhow!("{} is not UTF-8 text", in_path.to_string_lossy())
            } else {
                io_failed("read", in_path, e)
            }
        })?;
        let snapshot = snapshot::deserialize_str(&text).map_err(|e| anyhow!(e.to_string()))?;
        return Ok(ImportSummary {
            bundle_format_detected: "snapshot-json".to_string(),
            snapshot,
        });
    }

    let in_file = File::open(in_path).map_err(|e| io_failed("open bundle", in_path, e))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut snapshot_text = String::new();
    archive
        .by_name(SNAPSHOT_ENTRY)
        .context("bundle missing snapshot.json")?
        .read_to_string(&mut snapshot_text)
        .context("failed to read snapshot.json")?;

    if let Some(expected) = manifest.get("snapshotSha256").and_then(|v| v.as_str()) {
        let actual = sha256_hex(snapshot_text.as_bytes());
        if actual != expected {
            return Err(anyhow!("snapshot checksum mismatch"));
        }
    }

    let snapshot = snapshot::deserialize_str(&snapshot_text).map_err(|e| anyhow!(e.to_string()))?;
    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        snapshot,
    })
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path).map_err(|e| io_failed("open input file", path, e))?;
    let mut sig = [0u8; 4];
    let read = f
        .read(&mut sig)
        .map_err(|e| io_failed("read signature of", path, e))?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}

use crate::backup;
use crate::error::RosterError;
use crate::ipc::error::{err, fail, no_workspace, ok};
use crate::ipc::helpers::{get_opt_str, write_text_file};
use crate::ipc::types::{AppState, Request};
use crate::snapshot::{self, AppSnapshot};
use serde_json::json;
use std::path::PathBuf;

fn handle_snapshot_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_workspace(&req.id);
    };
    let out = match (
        get_opt_str(&req.params, "outPath"),
        get_opt_str(&req.params, "outDir"),
    ) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(d)) => PathBuf::from(d).join(snapshot::default_file_name(chrono::Utc::now())),
        (None, None) => {
            return match snapshot::serialize(store.state()) {
                Ok(doc) => ok(&req.id, json!({ "snapshot": doc })),
                Err(e) => fail(&req.id, &e),
            }
        }
    };
    let text = match snapshot::serialize_pretty(store.state()) {
        Ok(t) => t,
        Err(e) => return fail(&req.id, &e),
    };
    if let Err(e) = write_text_file(&out, &text) {
        return fail(&req.id, &e);
    }
    ok(
        &req.id,
        json!({
            "ok": true,
            "path": out.to_string_lossy(),
            "studentCount": store.state().students.len()
        }),
    )
}

/// Installs a decoded snapshot. Nothing changes unless decoding succeeded.
fn apply_snapshot(state: &mut AppState, snap: AppSnapshot) -> Option<usize> {
    let store = state.store.as_mut()?;
    let next = snap.into_state(store.state());
    let count = store.replace_state(next).students.len();
    tracing::info!(students = count, "snapshot applied");
    Some(count)
}

fn handle_snapshot_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.store.is_none() {
        return no_workspace(&req.id);
    }
    let decoded = match (
        req.params.get("snapshot"),
        get_opt_str(&req.params, "inPath"),
    ) {
        (Some(doc), _) => snapshot::deserialize(doc),
        (None, Some(p)) => match std::fs::read_to_string(PathBuf::from(&p)) {
            Ok(text) => snapshot::deserialize_str(&text),
            Err(e) => Err(RosterError::Io(format!("failed to read {p}: {e}"))),
        },
        (None, None) => Err(RosterError::BadParams("missing snapshot or inPath".into())),
    };
    let snap = match decoded {
        Ok(s) => s,
        Err(e) => return fail(&req.id, &e),
    };
    match apply_snapshot(state, snap) {
        Some(count) => ok(&req.id, json!({ "ok": true, "studentCount": count })),
        None => no_workspace(&req.id),
    }
}

fn handle_backup_export_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_workspace(&req.id);
    };
    let Some(out_path) = get_opt_str(&req.params, "outPath") else {
        return err(&req.id, "bad_params", "missing outPath", None);
    };

    let out = PathBuf::from(&out_path);
    let export = match backup::export_bundle(store.state(), &out) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "io_failed",
                e.to_string(),
                Some(json!({ "path": out_path })),
            )
        }
    };

    ok(
        &req.id,
        json!({
            "ok": true,
            "path": out_path,
            "bundleFormat": export.bundle_format,
            "entryCount": export.entry_count,
            "snapshotSha256": export.snapshot_sha256
        }),
    )
}

fn handle_backup_import_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.store.is_none() {
        return no_workspace(&req.id);
    }
    let Some(in_path) = get_opt_str(&req.params, "inPath") else {
        return err(&req.id, "bad_params", "missing inPath", None);
    };

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": in_path })),
        );
    }

    let import = match backup::import_bundle(&src) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                backup::import_error_code(&e),
                e.to_string(),
                Some(json!({ "path": in_path })),
            )
        }
    };

    match apply_snapshot(state, import.snapshot) {
        Some(count) => ok(
            &req.id,
            json!({
                "ok": true,
                "bundleFormatDetected": import.bundle_format_detected,
                "studentCount": count
            }),
        ),
        None => no_workspace(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "snapshot.export" => Some(handle_snapshot_export(state, req)),
        "snapshot.import" => Some(handle_snapshot_import(state, req)),
        "backup.exportBundle" => Some(handle_backup_export_bundle(state, req)),
        "backup.importBundle" => Some(handle_backup_import_bundle(state, req)),
        _ => None,
    }
}

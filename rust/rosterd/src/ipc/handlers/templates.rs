use crate::export;
use crate::ipc::error::{fail, ok};
use crate::ipc::helpers::{get_opt_str, write_text_file};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

/// Returns the template text, or writes it when `outPath`/`outDir` is given.
fn template_response(req: &Request, file_name: &str, csv: String) -> serde_json::Value {
    let out = match (
        get_opt_str(&req.params, "outPath"),
        get_opt_str(&req.params, "outDir"),
    ) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(d)) => PathBuf::from(d).join(file_name),
        (None, None) => {
            return ok(&req.id, json!({ "fileName": file_name, "csv": csv }));
        }
    };
    if let Err(e) = write_text_file(&out, &csv) {
        return fail(&req.id, &e);
    }
    ok(
        &req.id,
        json!({ "ok": true, "fileName": file_name, "path": out.to_string_lossy() }),
    )
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "templates.importCsv" => Some(template_response(
            req,
            export::IMPORT_TEMPLATE_FILE,
            export::import_template_csv(),
        )),
        "templates.activitiesCsv" => Some(template_response(
            req,
            export::ACTIVITIES_TEMPLATE_FILE,
            export::activities_template_csv(),
        )),
        _ => None,
    }
}

use crate::error::RosterResult;
use crate::export;
use crate::ipc::error::{fail, no_workspace, ok};
use crate::ipc::handlers::setup;
use crate::ipc::helpers::{filter_criteria, get_opt_str, write_text_file};
use crate::ipc::types::{AppState, Request};
use crate::query::{filter_roster, flatten, RosterRow};
use serde_json::json;
use std::path::PathBuf;

/// Matching students (each with only its matching activities) plus the
/// flattened rows.
fn run_query(state: &AppState, req: &Request) -> Option<RosterResult<(serde_json::Value, Vec<RosterRow>)>> {
    let store = state.store.as_ref()?;
    let default_sort = setup::default_sort(store.port().conn());
    let criteria = match filter_criteria(&req.params, default_sort) {
        Ok(c) => c,
        Err(e) => return Some(Err(e)),
    };
    let roster = store.state();
    let filtered = filter_roster(&roster.students, &criteria);
    let rows = flatten(&filtered, &roster.activity_colors);
    let students: Vec<serde_json::Value> = filtered
        .iter()
        .map(|f| {
            json!({
                "student": f.student,
                "activities": f.activities
            })
        })
        .collect();
    Some(Ok((
        json!({ "sortBy": criteria.sort_by.as_str(), "students": students }),
        rows,
    )))
}

fn handle_filter_query(state: &mut AppState, req: &Request) -> serde_json::Value {
    match run_query(state, req) {
        None => no_workspace(&req.id),
        Some(Err(e)) => fail(&req.id, &e),
        Some(Ok((mut result, rows))) => {
            result["rowCount"] = json!(rows.len());
            result["rows"] = json!(rows);
            ok(&req.id, result)
        }
    }
}

fn handle_filter_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let rows = match run_query(state, req) {
        None => return no_workspace(&req.id),
        Some(Err(e)) => return fail(&req.id, &e),
        Some(Ok((_, rows))) => rows,
    };
    let csv = export::rows_csv(&rows);
    let Some(out_path) = get_opt_str(&req.params, "outPath") else {
        return ok(&req.id, json!({ "rowCount": rows.len(), "csv": csv }));
    };
    let out = PathBuf::from(&out_path);
    if let Err(e) = write_text_file(&out, &csv) {
        return fail(&req.id, &e);
    }
    ok(
        &req.id,
        json!({ "ok": true, "path": out_path, "rowCount": rows.len() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "filter.query" => Some(handle_filter_query(state, req)),
        "filter.exportCsv" => Some(handle_filter_export_csv(state, req)),
        _ => None,
    }
}

use crate::error::RosterError;
use crate::import::{self, fresh_student_id, ImportDefaults, StagedRow};
use crate::ipc::error::{fail, no_workspace, ok};
use crate::ipc::handlers::setup;
use crate::ipc::helpers::{
    get_opt_str, get_required_str, parse_opt_grade, parse_opt_sub_class, row_patch,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn staged_result(rows: &[StagedRow]) -> serde_json::Value {
    json!({ "rowCount": rows.len(), "rows": rows })
}

fn handle_preview_text(state: &mut AppState, req: &Request) -> serde_json::Value {
    let text = req
        .params
        .get("text")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    match import::parse_free_text(text) {
        Ok(rows) => {
            state.staged.replace(rows);
            ok(&req.id, staged_result(state.staged.rows()))
        }
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_preview_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let text = match (
        req.params.get("text").and_then(|v| v.as_str()),
        get_opt_str(&req.params, "inPath"),
    ) {
        (Some(t), _) => t.to_string(),
        (None, Some(p)) => match std::fs::read_to_string(PathBuf::from(&p)) {
            Ok(t) => t,
            Err(e) => {
                return fail(
                    &req.id,
                    &RosterError::Io(format!("failed to read {p}: {e}")),
                )
            }
        },
        (None, None) => {
            return fail(
                &req.id,
                &RosterError::BadParams("missing text or inPath".into()),
            )
        }
    };
    match import::parse_tabular(&text) {
        Ok(rows) => {
            state.staged.replace(rows);
            ok(&req.id, staged_result(state.staged.rows()))
        }
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_staged(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, staged_result(state.staged.rows()))
}

fn handle_update_row(state: &mut AppState, req: &Request) -> serde_json::Value {
    let row_id = match get_required_str(&req.params, "rowId") {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    let patch = match row_patch(req.params.get("patch").unwrap_or(&serde_json::Value::Null)) {
        Ok(p) => p,
        Err(e) => return fail(&req.id, &e),
    };
    match state.staged.update_row(&row_id, patch) {
        Ok(row) => ok(&req.id, json!({ "row": row })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_delete_row(state: &mut AppState, req: &Request) -> serde_json::Value {
    let row_id = match get_required_str(&req.params, "rowId") {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    if !state.staged.delete_row(&row_id) {
        return fail(&req.id, &RosterError::NotFound(format!("staged row {row_id}")));
    }
    ok(&req.id, staged_result(state.staged.rows()))
}

fn handle_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.staged.clear();
    ok(&req.id, json!({ "ok": true }))
}

fn handle_commit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(&req.id);
    };
    let grade = match parse_opt_grade(&req.params, "defaultGrade") {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    let sub_class = match parse_opt_sub_class(&req.params, "defaultSubClass") {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    let configured = setup::import_defaults(store.port().conn());
    let defaults = ImportDefaults {
        grade: grade.or(configured.grade),
        sub_class: sub_class.or(configured.sub_class),
    };

    let (next, summary) =
        match import::merge_rows(store.state(), state.staged.rows(), defaults, fresh_student_id) {
            Ok(v) => v,
            Err(e) => return fail(&req.id, &e),
        };
    let student_count = store.replace_state(next).students.len();
    state.staged.clear();
    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        "import committed"
    );
    ok(
        &req.id,
        json!({ "summary": summary, "studentCount": student_count }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "import.previewText" => Some(handle_preview_text(state, req)),
        "import.previewCsv" => Some(handle_preview_csv(state, req)),
        "import.staged" => Some(handle_staged(state, req)),
        "import.updateRow" => Some(handle_update_row(state, req)),
        "import.deleteRow" => Some(handle_delete_row(state, req)),
        "import.clear" => Some(handle_clear(state, req)),
        "import.commit" => Some(handle_commit(state, req)),
        _ => None,
    }
}

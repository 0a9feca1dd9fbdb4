use crate::error::RosterError;
use crate::ipc::error::{fail, no_workspace, ok};
use crate::ipc::handlers::setup;
use crate::ipc::helpers::{
    get_bool, get_required_str, listing_criteria, parse_opt_day, student_from_params,
};
use crate::ipc::types::{AppState, Request};
use crate::query::roster_listing;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_workspace(&req.id);
    };
    let criteria = match listing_criteria(&req.params) {
        Ok(c) => c,
        Err(e) => return fail(&req.id, &e),
    };
    let students = roster_listing(&store.state().students, &criteria);
    ok(
        &req.id,
        json!({
            "total": store.state().students.len(),
            "students": students
        }),
    )
}

fn handle_students_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(&req.id);
    };
    let Some(raw) = req.params.get("student") else {
        return fail(&req.id, &RosterError::BadParams("missing student".into()));
    };
    let student = match student_from_params(raw) {
        Ok(s) => s,
        Err(e) => return fail(&req.id, &e),
    };
    let id = student.id.clone();
    match store.add_or_update_student(student) {
        Ok(next) => ok(
            &req.id,
            json!({ "student": next.student(&id), "studentCount": next.students.len() }),
        ),
        Err(e) => fail(&req.id, &e),
    }
}

/// Destructive calls need `confirm: true` unless the workspace turned the
/// check off.
fn require_confirm(state: &AppState, req: &Request, what: &str) -> Result<(), RosterError> {
    let needs = state
        .store
        .as_ref()
        .map_or(true, |s| setup::confirm_deletes(s.port().conn()));
    if needs && !get_bool(&req.params, "confirm", false) {
        return Err(RosterError::ConfirmRequired(format!(
            "{what} requires confirm: true"
        )));
    }
    Ok(())
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.store.is_none() {
        return no_workspace(&req.id);
    }
    let student_id = match get_required_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    if let Err(e) = require_confirm(state, req, "deleting a student") {
        return fail(&req.id, &e);
    }
    let Some(store) = state.store.as_mut() else {
        return no_workspace(&req.id);
    };
    let existed = store.state().student(&student_id).is_some();
    let next = store.delete_student(&student_id);
    ok(
        &req.id,
        json!({ "ok": true, "deleted": existed, "studentCount": next.students.len() }),
    )
}

fn handle_students_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.store.is_none() {
        return no_workspace(&req.id);
    }
    if let Err(e) = require_confirm(state, req, "clearing the roster") {
        return fail(&req.id, &e);
    }
    let Some(store) = state.store.as_mut() else {
        return no_workspace(&req.id);
    };
    let removed = store.state().students.len();
    store.clear_all();
    tracing::info!(removed, "roster cleared");
    ok(&req.id, json!({ "ok": true, "removed": removed }))
}

fn activity_change(
    state: &mut AppState,
    req: &Request,
    assign: bool,
) -> Result<serde_json::Value, RosterError> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let name = req
        .params
        .get("activityName")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    let day = parse_opt_day(&req.params, "day")?;
    let Some(store) = state.store.as_mut() else {
        return Ok(no_workspace(&req.id));
    };
    let next = if assign {
        store.assign_activity(&student_id, &name, day)?
    } else {
        if name.is_empty() {
            return Err(RosterError::NoSelection("select an activity first".into()));
        }
        store.remove_activity(&student_id, &name, day)?
    };
    Ok(ok(&req.id, json!({ "student": next.student(&student_id) })))
}

fn handle_students_assign_activity(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.store.is_none() {
        return no_workspace(&req.id);
    }
    activity_change(state, req, true).unwrap_or_else(|e| fail(&req.id, &e))
}

fn handle_students_remove_activity(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.store.is_none() {
        return no_workspace(&req.id);
    }
    activity_change(state, req, false).unwrap_or_else(|e| fail(&req.id, &e))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.upsert" => Some(handle_students_upsert(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.clear" => Some(handle_students_clear(state, req)),
        "students.assignActivity" => Some(handle_students_assign_activity(state, req)),
        "students.removeActivity" => Some(handle_students_remove_activity(state, req)),
        _ => None,
    }
}

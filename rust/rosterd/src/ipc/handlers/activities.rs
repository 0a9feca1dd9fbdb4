use crate::error::RosterError;
use crate::ipc::error::{fail, no_workspace, ok};
use crate::ipc::helpers::{get_opt_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::store::RosterState;
use serde_json::json;

fn catalog_result(state: &RosterState) -> serde_json::Value {
    json!({
        "catalog": state.catalog(),
        "activities": state.activities,
        "activityColors": state.activity_colors
    })
}

fn handle_activities_catalog(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return no_workspace(&req.id);
    };
    ok(&req.id, catalog_result(store.state()))
}

fn handle_activities_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(&req.id);
    };
    let name = match get_required_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    let color = get_opt_str(&req.params, "color");
    match store.add_activity_to_catalog(&name, color.as_deref()) {
        Ok(next) => ok(&req.id, catalog_result(next)),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_activities_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(&req.id);
    };
    let name = match get_required_str(&req.params, "name") {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    ok(&req.id, catalog_result(store.remove_activity_from_catalog(&name)))
}

fn handle_activities_set_color(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_mut() else {
        return no_workspace(&req.id);
    };
    let Some(name) = get_opt_str(&req.params, "name") else {
        return fail(&req.id, &RosterError::BadParams("missing name".into()));
    };
    let Some(color) = get_opt_str(&req.params, "color") else {
        return fail(&req.id, &RosterError::BadParams("missing color".into()));
    };
    match store.set_activity_color(&name, &color) {
        Ok(next) => ok(&req.id, catalog_result(next)),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "activities.catalog" => Some(handle_activities_catalog(state, req)),
        "activities.add" => Some(handle_activities_add(state, req)),
        "activities.remove" => Some(handle_activities_remove(state, req)),
        "activities.setColor" => Some(handle_activities_set_color(state, req)),
        _ => None,
    }
}

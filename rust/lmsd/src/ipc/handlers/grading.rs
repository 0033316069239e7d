use crate::db;
use crate::grading::{format_grade, grade_band, grade_color, parse_percentage_label};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::HandlerErr;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "config": state.grading,
            "persisted": state.db.is_some(),
        }),
    )
}

fn handle_config_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };
    let next = match state.grading.merge_patch(patch_obj) {
        Ok(cfg) => cfg,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if let Some(conn) = state.db.as_ref() {
        if let Err(e) = db::save_grading_config(conn, &next) {
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }

    tracing::info!(scale = ?next.grading_scale, pass_cutoff = next.pass_cutoff, "grading config updated");
    state.grading = next;
    ok(
        &req.id,
        json!({
            "config": state.grading,
            "persisted": state.db.is_some(),
        }),
    )
}

fn handle_format(state: &mut AppState, req: &Request) -> serde_json::Value {
    // Accepts a number or a label produced by the percentage scale ("76%").
    let raw = req.params.get("percentage");
    let percentage = raw
        .and_then(|v| v.as_i64())
        .or_else(|| raw.and_then(|v| v.as_str()).and_then(parse_percentage_label));
    let Some(percentage) = percentage else {
        return err(
            &req.id,
            "bad_params",
            "percentage must be an integer or a percentage label",
            None,
        );
    };
    ok(
        &req.id,
        json!({
            "scale": state.grading.grading_scale,
            "percentage": percentage,
            "label": format_grade(percentage, &state.grading),
            "color": grade_color(percentage, &state.grading),
        }),
    )
}

fn handle_format_many(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result: Result<Vec<serde_json::Value>, HandlerErr> = req
        .params
        .get("percentages")
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::bad_params("percentages must be an array"))
        .and_then(|arr| {
            arr.iter()
                .enumerate()
                .map(|(i, v)| -> Result<serde_json::Value, HandlerErr> {
                    let p = v.as_i64().ok_or_else(|| {
                        HandlerErr::bad_params("percentages must be integers")
                            .with_details(json!({ "index": i }))
                    })?;
                    let band = grade_band(p, &state.grading);
                    Ok(json!({ "percentage": p, "label": band.label, "color": band.color }))
                })
                .collect()
        });
    match result {
        Ok(grades) => ok(
            &req.id,
            json!({ "scale": state.grading.grading_scale, "grades": grades }),
        ),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grading.config.get" => Some(handle_config_get(state, req)),
        "grading.config.update" => Some(handle_config_update(state, req)),
        "grading.format" => Some(handle_format(state, req)),
        "grading.formatMany" => Some(handle_format_many(state, req)),
        _ => None,
    }
}

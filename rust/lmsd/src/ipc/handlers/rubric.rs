use crate::grading::{grade_band, GradingConfig};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_f64, get_required_str, parse_param, HandlerErr};
use crate::ipc::types::{AppState, Request, RubricSession};
use crate::rubric::{self, GradingCriterion, LevelKey};
use serde_json::json;
use uuid::Uuid;

fn summary_json(criteria: &[GradingCriterion], config: &GradingConfig) -> serde_json::Value {
    let agg = rubric::aggregate(criteria);
    let band = grade_band(agg.percentage, config);
    let mut out = json!(agg);
    out["label"] = json!(band.label);
    out["color"] = json!(band.color);
    out
}

fn session_json(session: &RubricSession, config: &GradingConfig) -> serde_json::Value {
    json!({
        "submissionId": session.submission_id,
        "criteria": session.criteria,
        "summary": summary_json(&session.criteria, config),
    })
}

fn criteria_from_params(params: &serde_json::Value) -> Result<Option<Vec<GradingCriterion>>, HandlerErr> {
    let Some(criteria) = parse_param::<Vec<GradingCriterion>>(params, "criteria")? else {
        return Ok(None);
    };
    rubric::normalize_criteria(criteria)
        .map(Some)
        .map_err(|e| HandlerErr::bad_params(e.to_string()))
}

fn new_session(params: &serde_json::Value) -> Result<RubricSession, HandlerErr> {
    // Only an absent id is generated; a wrongly typed one is the caller's bug.
    let submission_id = match parse_param::<String>(params, "submissionId")? {
        Some(id) if id.trim().is_empty() => {
            return Err(HandlerErr::bad_params("submissionId must not be empty"))
        }
        Some(id) => id.trim().to_string(),
        None => Uuid::new_v4().to_string(),
    };
    let criteria = criteria_from_params(params)?.unwrap_or_else(rubric::default_template);
    Ok(RubricSession {
        submission_id,
        criteria,
    })
}

fn open_session(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let session = new_session(&req.params)?;
    tracing::info!(submission = %session.submission_id, criteria = session.criteria.len(), "rubric opened");
    let out = session_json(&session, &state.grading);
    state.rubric = Some(session);
    Ok(out)
}

/// Moving to the next submission discards the current scores. A supplied
/// template is kept only if the caller sends it again.
fn reset_session(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let previous = state.rubric.as_ref().map(|s| s.submission_id.clone());
    let session = new_session(&req.params)?;
    tracing::info!(
        previous = previous.as_deref().unwrap_or("-"),
        submission = %session.submission_id,
        "rubric reset"
    );
    let out = session_json(&session, &state.grading);
    state.rubric = Some(session);
    Ok(out)
}

fn current_session(state: &AppState) -> Result<&RubricSession, HandlerErr> {
    state
        .rubric
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_rubric", "open a rubric first"))
}

fn get_session(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let session = current_session(state)?;
    Ok(session_json(session, &state.grading))
}

fn select_level(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let criterion_id = get_required_str(&req.params, "criterionId")?;
    let level = match req.params.get("level") {
        Some(raw) => serde_json::from_value::<LevelKey>(raw.clone()).map_err(|_| {
            HandlerErr::bad_params("level must be one of: excellent, good, satisfactory, needsWork")
                .with_details(json!({ "level": raw }))
        })?,
        None => return Err(HandlerErr::bad_params("missing level")),
    };
    let session = current_session(state)?;
    let criteria = rubric::select_level(&session.criteria, &criterion_id, level);
    let updated = RubricSession {
        submission_id: session.submission_id.clone(),
        criteria,
    };
    let out = session_json(&updated, &state.grading);
    state.rubric = Some(updated);
    Ok(out)
}

fn set_score(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let criterion_id = get_required_str(&req.params, "criterionId")?;
    let score = get_required_f64(&req.params, "score")?;
    let session = current_session(state)?;
    let criteria = rubric::set_score(&session.criteria, &criterion_id, score);
    let updated = RubricSession {
        submission_id: session.submission_id.clone(),
        criteria,
    };
    let out = session_json(&updated, &state.grading);
    state.rubric = Some(updated);
    Ok(out)
}

/// Stateless scoring for callers that keep the criteria themselves.
fn aggregate_criteria(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let criteria = criteria_from_params(&req.params)?
        .ok_or_else(|| HandlerErr::bad_params("missing criteria"))?;
    Ok(summary_json(&criteria, &state.grading))
}

fn respond(
    state: &mut AppState,
    req: &Request,
    f: fn(&mut AppState, &Request) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    match f(state, req) {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "rubric.open" => Some(respond(state, req, open_session)),
        "rubric.get" => Some(respond(state, req, get_session)),
        "rubric.selectLevel" => Some(respond(state, req, select_level)),
        "rubric.setScore" => Some(respond(state, req, set_score)),
        "rubric.reset" => Some(respond(state, req, reset_session)),
        "rubric.aggregate" => Some(respond(state, req, aggregate_criteria)),
        _ => None,
    }
}

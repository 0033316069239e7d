use crate::calendar::{self, Direction, MonthGrid, ScheduledSession, YearMonth};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_optional_i64, get_required_i64, parse_param, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn grid_json(grid: &MonthGrid, sessions: &[ScheduledSession]) -> serde_json::Value {
    let buckets = calendar::bucket_sessions(grid, sessions);
    let cells: Vec<serde_json::Value> = grid
        .cells
        .iter()
        .zip(buckets)
        .map(|(day, sessions)| {
            json!({
                "date": day.date,
                "day": chrono::Datelike::day(&day.date),
                "isCurrentMonth": day.is_current_month,
                "sessions": sessions,
            })
        })
        .collect();
    json!({
        "year": grid.view.year,
        "month": grid.view.month,
        "leading": grid.leading,
        "daysInMonth": grid.days_in_month,
        "trailing": grid.trailing,
        "cells": cells,
    })
}

fn build(view: YearMonth) -> Result<MonthGrid, HandlerErr> {
    calendar::build_grid(view.year, view.month).map_err(|e| {
        HandlerErr::bad_params(e.to_string()).with_details(json!({
            "year": view.year,
            "month": view.month,
        }))
    })
}

fn sessions_param(params: &serde_json::Value) -> Result<Vec<ScheduledSession>, HandlerErr> {
    Ok(parse_param::<Vec<ScheduledSession>>(params, "sessions")?.unwrap_or_default())
}

fn handle_grid(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let year = get_optional_i64(&req.params, "year")?;
    let month = get_optional_i64(&req.params, "month")?;
    let view = YearMonth {
        year: match year {
            Some(y) => i32::try_from(y).map_err(|_| HandlerErr::bad_params("year out of range"))?,
            None => state.calendar.year,
        },
        month: match month {
            Some(m) => u32::try_from(m).map_err(|_| HandlerErr::bad_params("month must be in 0..=11"))?,
            None => state.calendar.month,
        },
    };
    let sessions = sessions_param(&req.params)?;
    let grid = build(view)?;
    state.calendar = view;
    Ok(grid_json(&grid, &sessions))
}

fn handle_navigate(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let step = get_required_i64(&req.params, "direction")?;
    let direction = Direction::from_step(step)
        .ok_or_else(|| HandlerErr::bad_params("direction must be -1 or 1"))?;
    let sessions = sessions_param(&req.params)?;
    let view = calendar::navigate(state.calendar, direction);
    let grid = build(view)?;
    tracing::debug!(year = view.year, month = view.month, "calendar view moved");
    state.calendar = view;
    Ok(grid_json(&grid, &sessions))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "calendar.grid" => handle_grid(state, req),
        "calendar.navigate" => handle_navigate(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}

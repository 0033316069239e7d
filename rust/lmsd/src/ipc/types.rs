use std::path::PathBuf;

use crate::calendar::YearMonth;
use crate::grading::GradingConfig;
use crate::rubric::GradingCriterion;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Rubric being filled in for the submission currently on screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricSession {
    pub submission_id: String,
    pub criteria: Vec<GradingCriterion>,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub grading: GradingConfig,
    pub rubric: Option<RubricSession>,
    pub calendar: YearMonth,
}

impl AppState {
    pub fn new(today: chrono::NaiveDate) -> Self {
        Self {
            workspace: None,
            db: None,
            grading: GradingConfig::default(),
            rubric: None,
            calendar: YearMonth::from_date(today),
        }
    }
}

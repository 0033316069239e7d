use crate::grading::ColorToken;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelKey {
    Excellent,
    Good,
    Satisfactory,
    NeedsWork,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionLevel {
    pub key: LevelKey,
    pub name: String,
    pub points: f64,
    pub color: ColorToken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingCriterion {
    pub id: String,
    pub name: String,
    pub max_points: f64,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub selected_level: Option<LevelKey>,
    pub levels: Vec<CriterionLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub total_score: f64,
    pub total_max: f64,
    pub percentage: i64,
}

#[derive(Debug, Error, PartialEq)]
pub enum RubricError {
    #[error("criterion at index {0} has an empty id")]
    EmptyId(usize),

    #[error("duplicate criterion id: {0}")]
    DuplicateId(String),

    #[error("criterion {id}: maxPoints must be a positive number")]
    BadMaxPoints { id: String },

    #[error("criterion {id}: level points must be within 0..=maxPoints")]
    LevelOutOfRange { id: String },

    #[error("criterion {id}: duplicate level key")]
    DuplicateLevel { id: String },
}

fn clamp_score(raw: f64, max_points: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.max(0.0).min(max_points)
}

fn update_one<F>(criteria: &[GradingCriterion], criterion_id: &str, f: F) -> Vec<GradingCriterion>
where
    F: FnOnce(&mut GradingCriterion),
{
    let mut out = criteria.to_vec();
    if let Some(c) = out.iter_mut().find(|c| c.id == criterion_id) {
        f(c);
    }
    out
}

/// Scores a criterion from one of its predefined levels. A level key the
/// criterion does not carry leaves it untouched.
pub fn select_level(
    criteria: &[GradingCriterion],
    criterion_id: &str,
    level_key: LevelKey,
) -> Vec<GradingCriterion> {
    update_one(criteria, criterion_id, |c| {
        if let Some(points) = c.levels.iter().find(|l| l.key == level_key).map(|l| l.points) {
            c.score = points;
            c.selected_level = Some(level_key);
        }
    })
}

/// Manual score entry. Always clears the selected level; the value is
/// clamped to `[0, max_points]` and NaN counts as 0.
pub fn set_score(
    criteria: &[GradingCriterion],
    criterion_id: &str,
    raw_score: f64,
) -> Vec<GradingCriterion> {
    update_one(criteria, criterion_id, |c| {
        c.score = clamp_score(raw_score, c.max_points);
        c.selected_level = None;
    })
}

pub fn aggregate(criteria: &[GradingCriterion]) -> Aggregate {
    let total_score: f64 = criteria.iter().map(|c| c.score).sum();
    let total_max: f64 = criteria.iter().map(|c| c.max_points).sum();
    let percentage = if total_max > 0.0 {
        (total_score / total_max * 100.0).round() as i64
    } else {
        0
    };
    Aggregate {
        total_score,
        total_max,
        percentage,
    }
}

pub fn validate_criteria(criteria: &[GradingCriterion]) -> Result<(), RubricError> {
    let mut ids = HashSet::new();
    for (i, c) in criteria.iter().enumerate() {
        if c.id.trim().is_empty() {
            return Err(RubricError::EmptyId(i));
        }
        if !ids.insert(c.id.as_str()) {
            return Err(RubricError::DuplicateId(c.id.clone()));
        }
        if !c.max_points.is_finite() || c.max_points <= 0.0 {
            return Err(RubricError::BadMaxPoints { id: c.id.clone() });
        }
        let mut keys = HashSet::new();
        for l in &c.levels {
            if !(0.0..=c.max_points).contains(&l.points) {
                return Err(RubricError::LevelOutOfRange { id: c.id.clone() });
            }
            if !keys.insert(l.key) {
                return Err(RubricError::DuplicateLevel { id: c.id.clone() });
            }
        }
    }
    Ok(())
}

/// Validates a caller-supplied template and brings each score into range.
/// A selected level that no longer matches the score is dropped.
pub fn normalize_criteria(criteria: Vec<GradingCriterion>) -> Result<Vec<GradingCriterion>, RubricError> {
    validate_criteria(&criteria)?;
    Ok(criteria
        .into_iter()
        .map(|mut c| {
            c.score = clamp_score(c.score, c.max_points);
            let level_points = c
                .selected_level
                .and_then(|k| c.levels.iter().find(|l| l.key == k))
                .map(|l| l.points);
            if level_points != Some(c.score) {
                c.selected_level = None;
            }
            c
        })
        .collect())
}

const DEFAULT_CRITERIA: [(&str, &str, f64); 4] = [
    ("code-quality", "Code Quality", 30.0),
    ("functionality", "Functionality", 40.0),
    ("documentation", "Documentation", 20.0),
    ("testing", "Testing", 10.0),
];

const DEFAULT_LEVELS: [(LevelKey, &str, f64, ColorToken); 4] = [
    (LevelKey::Excellent, "Excellent", 1.0, ColorToken::Green),
    (LevelKey::Good, "Good", 0.8, ColorToken::Blue),
    (LevelKey::Satisfactory, "Satisfactory", 0.6, ColorToken::Yellow),
    (LevelKey::NeedsWork, "Needs Work", 0.4, ColorToken::Red),
];

/// Fresh rubric for a new submission: nothing scored, no level selected.
pub fn default_template() -> Vec<GradingCriterion> {
    DEFAULT_CRITERIA
        .iter()
        .map(|(id, name, max_points)| GradingCriterion {
            id: id.to_string(),
            name: name.to_string(),
            max_points: *max_points,
            score: 0.0,
            selected_level: None,
            levels: DEFAULT_LEVELS
                .iter()
                .map(|(key, level_name, share, color)| CriterionLevel {
                    key: *key,
                    name: level_name.to_string(),
                    points: (max_points * share).round(),
                    color: *color,
                })
                .collect(),
        })
        .collect()
}

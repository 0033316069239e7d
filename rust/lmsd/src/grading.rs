use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Green,
    Blue,
    Yellow,
    Orange,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingScale {
    #[default]
    Percentage,
    Letter,
    PassFail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterBand {
    pub min_percentage: i64,
    pub label: String,
    pub color: ColorToken,
}

impl LetterBand {
    fn new(min_percentage: i64, label: &str, color: ColorToken) -> Self {
        Self {
            min_percentage,
            label: label.to_string(),
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingConfig {
    pub grading_scale: GradingScale,
    pub letter_bands: Vec<LetterBand>,
    pub pass_cutoff: i64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            grading_scale: GradingScale::Percentage,
            letter_bands: vec![
                LetterBand::new(90, "A", ColorToken::Green),
                LetterBand::new(80, "B", ColorToken::Blue),
                LetterBand::new(70, "C", ColorToken::Yellow),
                LetterBand::new(60, "D", ColorToken::Orange),
                LetterBand::new(0, "F", ColorToken::Red),
            ],
            pass_cutoff: 60,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("letterBands must not be empty")]
    EmptyBands,

    #[error("letterBands[{index}].minPercentage must be in 0..=100, got {value}")]
    BandOutOfRange { index: usize, value: i64 },

    #[error("letterBands must be strictly descending by minPercentage (index {index})")]
    UnorderedBands { index: usize },

    #[error("the last letter band must start at 0 so every percentage has a grade")]
    BandsMustReachZero,

    #[error("letterBands[{index}].label must be a non-empty, unique string")]
    BadLabel { index: usize },

    #[error("passCutoff must be in 0..=100, got {0}")]
    CutoffOutOfRange(i64),

    #[error("{field} must be {expected}")]
    BadField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unknown grading field: {0}")]
    UnknownField(String),

    #[error("invalid {field}: {source}")]
    Json {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl GradingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.letter_bands.is_empty() {
            return Err(ConfigError::EmptyBands);
        }
        let mut labels = HashSet::new();
        for (index, band) in self.letter_bands.iter().enumerate() {
            if !(0..=100).contains(&band.min_percentage) {
                return Err(ConfigError::BandOutOfRange {
                    index,
                    value: band.min_percentage,
                });
            }
            if index > 0 && band.min_percentage >= self.letter_bands[index - 1].min_percentage {
                return Err(ConfigError::UnorderedBands { index });
            }
            let label = band.label.trim();
            if label.is_empty() || !labels.insert(label.to_string()) {
                return Err(ConfigError::BadLabel { index });
            }
        }
        if self.letter_bands.last().map(|b| b.min_percentage) != Some(0) {
            return Err(ConfigError::BandsMustReachZero);
        }
        if !(0..=100).contains(&self.pass_cutoff) {
            return Err(ConfigError::CutoffOutOfRange(self.pass_cutoff));
        }
        Ok(())
    }

    /// Applies a camelCase patch object and returns the validated result.
    /// `self` is left untouched when the patch is rejected.
    pub fn merge_patch(&self, patch: &Map<String, Value>) -> Result<GradingConfig, ConfigError> {
        let mut next = self.clone();
        for (k, v) in patch {
            match k.as_str() {
                "gradingScale" => {
                    next.grading_scale = serde_json::from_value(v.clone()).map_err(|source| {
                        ConfigError::Json {
                            field: "gradingScale",
                            source,
                        }
                    })?;
                }
                "letterBands" => {
                    next.letter_bands = serde_json::from_value(v.clone()).map_err(|source| {
                        ConfigError::Json {
                            field: "letterBands",
                            source,
                        }
                    })?;
                }
                "passCutoff" => {
                    next.pass_cutoff = v.as_i64().ok_or(ConfigError::BadField {
                        field: "passCutoff",
                        expected: "an integer",
                    })?;
                }
                other => return Err(ConfigError::UnknownField(other.to_string())),
            }
        }
        next.validate()?;
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    pub label: String,
    pub color: ColorToken,
}

fn letter_band(percentage: i64, bands: &[LetterBand]) -> Option<&LetterBand> {
    // Bands are descending; a percentage equal to a threshold belongs to that band.
    bands
        .iter()
        .find(|b| percentage >= b.min_percentage)
        .or_else(|| bands.last())
}

/// Resolves the label and color for a percentage. `format_grade` and
/// `grade_color` both go through here so they can never disagree.
pub fn grade_band(percentage: i64, config: &GradingConfig) -> GradeBand {
    match config.grading_scale {
        GradingScale::PassFail => {
            if percentage >= config.pass_cutoff {
                GradeBand {
                    label: "Pass".to_string(),
                    color: ColorToken::Green,
                }
            } else {
                GradeBand {
                    label: "Fail".to_string(),
                    color: ColorToken::Red,
                }
            }
        }
        GradingScale::Letter => match letter_band(percentage, &config.letter_bands) {
            Some(b) => GradeBand {
                label: b.label.clone(),
                color: b.color,
            },
            None => GradeBand {
                label: format_percentage(percentage),
                color: ColorToken::Red,
            },
        },
        GradingScale::Percentage => GradeBand {
            label: format_percentage(percentage),
            color: letter_band(percentage, &config.letter_bands)
                .map(|b| b.color)
                .unwrap_or(ColorToken::Red),
        },
    }
}

pub fn format_grade(percentage: i64, config: &GradingConfig) -> String {
    grade_band(percentage, config).label
}

pub fn grade_color(percentage: i64, config: &GradingConfig) -> ColorToken {
    grade_band(percentage, config).color
}

fn format_percentage(percentage: i64) -> String {
    format!("{}%", percentage)
}

/// Inverse of the percentage-scale label.
pub fn parse_percentage_label(label: &str) -> Option<i64> {
    label.trim().strip_suffix('%')?.trim().parse::<i64>().ok()
}

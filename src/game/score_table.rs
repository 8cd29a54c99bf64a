use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("results link has no `data` parameter")]
    MissingData,
    #[error("data token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("data token is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("data is not a score table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("score table has {rows} score rows for {categories} categories")]
    RowCountMismatch { rows: usize, categories: usize },
    #[error("score row {row} has {len} entries for {teams} teams")]
    RowLengthMismatch { row: usize, len: usize, teams: usize },
    #[error("score for category {category}, team {team} is {value}; scores must be finite and non-negative")]
    InvalidScore {
        category: usize,
        team: usize,
        value: f64,
    },
    #[error("{what} {index} adds up to a non-finite total")]
    NonFiniteTotal { what: &'static str, index: usize },
}

/// Teams x categories table as shared between the editor and the results view.
/// `scores[category][team]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub teams: Vec<String>,
    pub categories: Vec<String>,
    pub scores: Vec<Vec<f64>>,
}

impl ScoreTable {
    pub fn new(
        teams: Vec<String>,
        categories: Vec<String>,
        scores: Vec<Vec<f64>>,
    ) -> Result<Self, DataError> {
        let table = Self {
            teams,
            categories,
            scores,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.scores.len() != self.categories.len() {
            return Err(DataError::RowCountMismatch {
                rows: self.scores.len(),
                categories: self.categories.len(),
            });
        }
        for (row, values) in self.scores.iter().enumerate() {
            if values.len() != self.teams.len() {
                return Err(DataError::RowLengthMismatch {
                    row,
                    len: values.len(),
                    teams: self.teams.len(),
                });
            }
            if let Some((team, &value)) = values
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v < 0.0)
            {
                return Err(DataError::InvalidScore {
                    category: row,
                    team,
                    value,
                });
            }
        }
        if let Some(index) = (0..self.teams.len()).find(|&t| !self.team_total(t).is_finite()) {
            return Err(DataError::NonFiniteTotal {
                what: "team",
                index,
            });
        }
        if let Some(index) =
            (0..self.categories.len()).find(|&c| !self.category_total(c).is_finite())
        {
            return Err(DataError::NonFiniteTotal {
                what: "category",
                index,
            });
        }
        Ok(())
    }

    #[inline(always)]
    pub fn score(&self, category: usize, team: usize) -> f64 {
        self.scores[category][team]
    }

    pub fn team_total(&self, team: usize) -> f64 {
        self.scores.iter().map(|row| row[team]).sum()
    }

    pub fn category_total(&self, category: usize) -> f64 {
        self.scores[category].iter().sum()
    }
}

/// Read-only figures derived once per load.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub team_totals: Vec<f64>,
    pub category_totals: Vec<f64>,
    /// Scale denominator for bar heights and the animation's finish line.
    pub max_score: f64,
    /// Team totals sorted ascending and rescaled to ms since animation start.
    /// Empty when `max_score == 0`.
    pub stage_boundaries: Vec<f64>,
    pub total_duration_ms: f64,
    pub longest_team_name: String,
    pub longest_category_name: String,
}

impl DerivedMetrics {
    pub fn compute(table: &ScoreTable, total_duration_ms: f64) -> Self {
        let team_totals: Vec<f64> = (0..table.teams.len())
            .map(|t| table.team_total(t))
            .collect();
        let category_totals: Vec<f64> = (0..table.categories.len())
            .map(|c| table.category_total(c))
            .collect();
        let max_score = team_totals.iter().copied().fold(0.0_f64, f64::max);

        let stage_boundaries = if max_score > 0.0 {
            let mut sorted = team_totals.clone();
            sorted.sort_by(f64::total_cmp);
            sorted
                .into_iter()
                .map(|total| total * (total_duration_ms / max_score))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            team_totals,
            category_totals,
            max_score,
            stage_boundaries,
            total_duration_ms,
            longest_team_name: longest(&table.teams),
            longest_category_name: longest(&table.categories),
        }
    }

    /// Every team scored zero: bars stay flat and nothing divides by `max_score`.
    #[inline(always)]
    pub fn is_degenerate(&self) -> bool {
        self.max_score <= 0.0
    }

    /// Pixels per point for a chart band of `band_height`; zero for a degenerate table.
    pub fn pixels_per_point(&self, band_height: f32) -> f32 {
        if self.is_degenerate() {
            0.0
        } else {
            (f64::from(band_height) / self.max_score) as f32
        }
    }
}

// Ties go to the later name.
fn longest(names: &[String]) -> String {
    names
        .iter()
        .max_by_key(|name| name.chars().count())
        .cloned()
        .unwrap_or_default()
}

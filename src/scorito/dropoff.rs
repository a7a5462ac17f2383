use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Relative gap between neighbours that always counts as a drop-off.
pub const RELATIVE_GAP: f64 = 0.08;
/// Share of the interquartile range used as the absolute gap threshold.
pub const IQR_SHARE: f64 = 0.25;
pub const MIN_ABSOLUTE_GAP: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("asc"),
            SortDirection::Descending => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(EngineError::InvalidChoice {
                what: "sort direction",
                value: other.to_string(),
            }),
        }
    }
}

/// Interquartile range with linear interpolation between order statistics.
pub fn interquartile_range(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.len() < 2 {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);
    quantile(&sorted, 0.75) - quantile(&sorted, 0.25)
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

/// Positions `i` where a drop-off separates ranked entries `i` and `i + 1`.
///
/// `values` must already be ranked in `direction`. A step counts when it
/// moves the way the ranking runs and is either at least 8% of the larger
/// magnitude or at least `max(IQR / 4, 1)`.
pub fn drop_off_boundaries(values: &[f64], direction: SortDirection) -> Vec<usize> {
    if values.len() < 2 {
        return Vec::new();
    }
    let threshold = (IQR_SHARE * interquartile_range(values)).max(MIN_ABSOLUTE_GAP);

    values
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let (a, b) = (pair[0], pair[1]);
            let gap = match direction {
                SortDirection::Descending => a - b,
                SortDirection::Ascending => b - a,
            };
            if gap.is_nan() || gap <= 0.0 {
                return None;
            }
            let scale = a.abs().max(b.abs());
            let relative = if scale > 0.0 { gap / scale } else { 0.0 };
            (relative >= RELATIVE_GAP || gap >= threshold).then_some(i)
        })
        .collect()
}

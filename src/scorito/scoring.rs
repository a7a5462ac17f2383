use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bracket::RoundLabel;
use crate::errors::{EngineError, EngineResult};
use crate::rating::Tier;

const COLUMNS: usize = RoundLabel::PLAYED.len();

/// Fantasy points per tier for reaching each of R1, R2, R3, R4, QF, SF, F.
///
/// Rows hold the points earned *for* a round; a player's total is the running
/// sum up to the furthest round reached. Champions score like finalists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Tier, Vec<f64>>", into = "BTreeMap<Tier, Vec<f64>>")]
pub struct ScoringTable {
    awards: BTreeMap<Tier, [f64; COLUMNS]>,
}

impl Default for ScoringTable {
    fn default() -> Self {
        let rows = [
            (Tier::A, [10.0, 20.0, 30.0, 40.0, 60.0, 80.0, 100.0]),
            (Tier::B, [20.0, 40.0, 60.0, 80.0, 100.0, 120.0, 140.0]),
            (Tier::C, [30.0, 60.0, 90.0, 120.0, 140.0, 160.0, 180.0]),
            (Tier::D, [60.0, 90.0, 120.0, 160.0, 180.0, 200.0, 200.0]),
        ];
        Self {
            awards: rows.into_iter().collect(),
        }
    }
}

impl ScoringTable {
    /// Every tier needs a full row of finite values.
    pub fn new(rows: BTreeMap<Tier, Vec<f64>>) -> EngineResult<Self> {
        let mut awards = BTreeMap::new();
        for tier in Tier::ALL {
            let row = rows
                .get(&tier)
                .ok_or_else(|| EngineError::ScoringTable(format!("missing row for tier {tier}")))?;
            let row: [f64; COLUMNS] =
                row.as_slice()
                    .try_into()
                    .map_err(|_| EngineError::ScoringRowLength {
                        tier: tier.to_string(),
                        len: row.len(),
                        expected: COLUMNS,
                    })?;
            if let Some(bad) = row.iter().find(|v| !v.is_finite()) {
                return Err(EngineError::ScoringTable(format!(
                    "tier {tier} has non-finite points {bad}"
                )));
            }
            awards.insert(tier, row);
        }
        Ok(Self { awards })
    }

    /// Parses the tab-separated scoring file: a `Tier` header row followed by
    /// one row per tier. Blank lines and `#` comments are skipped.
    pub fn from_tsv(text: &str) -> EngineResult<Self> {
        let mut rows = BTreeMap::new();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut cells = line.split('\t').map(str::trim);
            let head = cells.next().unwrap_or_default();
            if head.eq_ignore_ascii_case("tier") {
                continue;
            }
            let tier: Tier = head.parse()?;
            let points = cells
                .map(|cell| {
                    cell.parse::<f64>().map_err(|_| {
                        EngineError::ScoringTable(format!("tier {tier}: `{cell}` is not a number"))
                    })
                })
                .collect::<EngineResult<Vec<f64>>>()?;
            rows.insert(tier, points);
        }
        Self::new(rows)
    }

    /// Same table with every entry multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let awards = self
            .awards
            .iter()
            .map(|(tier, row)| (*tier, row.map(|v| v * factor)))
            .collect();
        Self { awards }
    }

    /// Points earned for reaching `round` (zero for the virtual title round).
    pub fn award(&self, tier: Tier, round: RoundLabel) -> f64 {
        match round.column() {
            Some(col) => self.awards[&tier][col],
            None => 0.0,
        }
    }

    /// Total points for a run whose furthest round is `round`.
    ///
    /// Columns a small draw skips are folded into the next round it plays.
    pub fn cumulative(&self, tier: Tier, round: RoundLabel) -> f64 {
        let last = round.column().unwrap_or(COLUMNS - 1);
        self.awards[&tier][..=last].iter().sum()
    }
}

impl TryFrom<BTreeMap<Tier, Vec<f64>>> for ScoringTable {
    type Error = EngineError;

    fn try_from(rows: BTreeMap<Tier, Vec<f64>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<ScoringTable> for BTreeMap<Tier, Vec<f64>> {
    fn from(table: ScoringTable) -> Self {
        table
            .awards
            .into_iter()
            .map(|(tier, row)| (tier, row.to_vec()))
            .collect()
    }
}

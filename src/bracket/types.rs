use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::rating::PlayerId;

/// Deepest draw with a distinct label for every round (a 128-draw).
pub const MAX_ROUNDS: usize = 7;

/// Round labels in increasing order of tournament progress.
///
/// `W` is the virtual round past the Final: reaching it means winning the
/// tournament. Draw nodes never carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoundLabel {
    R1,
    R2,
    R3,
    R4,
    QF,
    SF,
    F,
    W,
}

impl RoundLabel {
    /// The seven played rounds, in scoring-column order.
    pub const PLAYED: [RoundLabel; 7] = [
        RoundLabel::R1,
        RoundLabel::R2,
        RoundLabel::R3,
        RoundLabel::R4,
        RoundLabel::QF,
        RoundLabel::SF,
        RoundLabel::F,
    ];

    /// Scoring column for a played round.
    pub fn column(&self) -> Option<usize> {
        Self::PLAYED.iter().position(|l| l == self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundLabel::R1 => "R1",
            RoundLabel::R2 => "R2",
            RoundLabel::R3 => "R3",
            RoundLabel::R4 => "R4",
            RoundLabel::QF => "QF",
            RoundLabel::SF => "SF",
            RoundLabel::F => "F",
            RoundLabel::W => "W",
        }
    }

    /// Labels of a draw with `rounds` played rounds: the last three are
    /// QF/SF/F, the earlier ones count up from R1.
    pub fn for_draw(rounds: usize) -> EngineResult<Vec<RoundLabel>> {
        if rounds == 0 || rounds > MAX_ROUNDS {
            return Err(EngineError::DrawTooDeep {
                rounds,
                max: MAX_ROUNDS,
            });
        }
        let early = rounds.saturating_sub(3);
        let late = rounds - early;
        let mut labels: Vec<RoundLabel> = Self::PLAYED[..early].to_vec();
        labels.extend_from_slice(&Self::PLAYED[Self::PLAYED.len() - late..]);
        Ok(labels)
    }
}

impl fmt::Display for RoundLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What sits in a first-round slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Player(PlayerId),
    Bye,
    /// Not known yet (e.g. a qualifier still to be decided).
    Tbd,
}

impl Slot {
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            Slot::Player(id) => Some(*id),
            _ => None,
        }
    }
}

/// Index of a node in the draw arena.
pub type NodeId = usize;

/// Where a match gets its two participants from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    /// First-round match with fixed slots.
    Entrants([Slot; 2]),
    /// Later match fed by the winners of two earlier nodes.
    Winners([NodeId; 2]),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawNode {
    pub id: NodeId,
    /// Zero-based round, 0 being the first round.
    pub round: usize,
    pub label: RoundLabel,
    /// Position within the round, top of the draw first.
    pub index: usize,
    pub feed: Feed,
    pub parent: Option<NodeId>,
    /// Identifier the caller used when the draw came from a node list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<i64>,
}

impl DrawNode {
    pub fn children(&self) -> Option<[NodeId; 2]> {
        match self.feed {
            Feed::Winners(children) => Some(children),
            Feed::Entrants(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.feed, Feed::Entrants(_))
    }
}

/// A match slot supplied by the caller when describing a draw node by node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: i64,
    pub round: RoundLabel,
    /// Two entries for first-round nodes, empty otherwise.
    #[serde(default)]
    pub slots: Vec<Slot>,
    /// Two child node ids for later rounds, empty for first-round nodes.
    #[serde(default)]
    pub children: Vec<i64>,
}

//! Position state of the spread.

use serde::{Deserialize, Serialize};

/// Side of an open spread trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Long A, short hedge-ratio units of B.
    Long,
    /// Short A, long hedge-ratio units of B.
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

/// Per-timestamp state. Mutated only by the simulator's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionState {
    #[default]
    Flat,
    LongSpread,
    ShortSpread,
}

impl PositionState {
    pub fn is_flat(self) -> bool {
        self == Self::Flat
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            Self::Flat => None,
            Self::LongSpread => Some(Direction::Long),
            Self::ShortSpread => Some(Direction::Short),
        }
    }
}

impl From<Direction> for PositionState {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Long => Self::LongSpread,
            Direction::Short => Self::ShortSpread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_through_state() {
        for d in [Direction::Long, Direction::Short] {
            assert_eq!(PositionState::from(d).direction(), Some(d));
        }
        assert_eq!(PositionState::Flat.direction(), None);
        assert!(PositionState::default().is_flat());
    }

    #[test]
    fn signs() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
    }
}

//! Entry/exit state machine over {FLAT, LONG_SPREAD, SHORT_SPREAD}.
//!
//! `decide` is a pure function of the current state, the bar's z-score and
//! whether the bar is the last one. It never flips LONG to SHORT directly:
//! an exiting bar always lands on FLAT, and entries are only considered from
//! FLAT on a later bar.
//!
//! Exit priority when several conditions hold:
//! 1. DataQuality (z-score undefined)
//! 2. StopLoss (|z| > stop)
//! 3. MeanReversion (LONG: z ≥ -exit, SHORT: z ≤ +exit)
//! 4. EndOfData

use serde::{Deserialize, Serialize};

use crate::config::StrategyParams;
use crate::domain::{Direction, ExitReason, PositionState, Reading};

/// Z-score thresholds in standard deviation units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub entry: f64,
    pub exit: f64,
    pub stop_loss: f64,
}

impl Thresholds {
    pub fn from_params(params: &StrategyParams) -> Self {
        Self {
            entry: params.entry_threshold,
            exit: params.exit_threshold,
            stop_loss: params.stop_loss_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Hold,
    Enter(Direction),
    Exit(ExitReason),
}

impl Action {
    /// State after applying this action to `state`.
    pub fn apply(self, state: PositionState) -> PositionState {
        match self {
            Self::Hold => state,
            Self::Enter(direction) => direction.into(),
            Self::Exit(_) => PositionState::Flat,
        }
    }
}

pub fn decide(state: PositionState, z: Reading, is_last: bool, t: &Thresholds) -> Action {
    let Some(z) = z.value() else {
        return match state {
            PositionState::Flat => Action::Hold,
            _ => Action::Exit(ExitReason::DataQuality),
        };
    };

    match state.direction() {
        Some(direction) => {
            if z.abs() > t.stop_loss {
                Action::Exit(ExitReason::StopLoss)
            } else if reverted(direction, z, t.exit) {
                Action::Exit(ExitReason::MeanReversion)
            } else if is_last {
                Action::Exit(ExitReason::EndOfData)
            } else {
                Action::Hold
            }
        }
        None => {
            // An entry on the last bar could only be force-closed immediately.
            if is_last || z.abs() > t.stop_loss {
                Action::Hold
            } else if z <= -t.entry {
                Action::Enter(Direction::Long)
            } else if z >= t.entry {
                Action::Enter(Direction::Short)
            } else {
                Action::Hold
            }
        }
    }
}

fn reverted(direction: Direction, z: f64, exit: f64) -> bool {
    match direction {
        Direction::Long => z >= -exit,
        Direction::Short => z <= exit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Undefined;

    const T: Thresholds = Thresholds {
        entry: 2.0,
        exit: 0.5,
        stop_loss: 3.5,
    };

    fn z(v: f64) -> Reading {
        Reading::Defined(v)
    }

    #[test]
    fn flat_entries() {
        assert_eq!(decide(PositionState::Flat, z(-2.0), false, &T), Action::Enter(Direction::Long));
        assert_eq!(decide(PositionState::Flat, z(2.1), false, &T), Action::Enter(Direction::Short));
        assert_eq!(decide(PositionState::Flat, z(1.99), false, &T), Action::Hold);
        assert_eq!(decide(PositionState::Flat, z(-1.0), false, &T), Action::Hold);
    }

    #[test]
    fn no_entry_beyond_stop_or_on_last_bar() {
        assert_eq!(decide(PositionState::Flat, z(3.6), false, &T), Action::Hold);
        assert_eq!(decide(PositionState::Flat, z(-3.6), false, &T), Action::Hold);
        assert_eq!(decide(PositionState::Flat, z(2.5), true, &T), Action::Hold);
    }

    #[test]
    fn long_exits_on_reversion() {
        let s = PositionState::LongSpread;
        assert_eq!(decide(s, z(-1.0), false, &T), Action::Hold);
        assert_eq!(decide(s, z(-0.5), false, &T), Action::Exit(ExitReason::MeanReversion));
        assert_eq!(decide(s, z(1.2), false, &T), Action::Exit(ExitReason::MeanReversion));
    }

    #[test]
    fn short_exits_on_reversion() {
        let s = PositionState::ShortSpread;
        assert_eq!(decide(s, z(1.0), false, &T), Action::Hold);
        assert_eq!(decide(s, z(0.5), false, &T), Action::Exit(ExitReason::MeanReversion));
        assert_eq!(decide(s, z(-2.5), false, &T), Action::Exit(ExitReason::MeanReversion));
    }

    #[test]
    fn stop_loss_takes_priority() {
        // z = 3.6 both breaches the stop and, for a long, counts as reverted.
        assert_eq!(
            decide(PositionState::LongSpread, z(3.6), true, &T),
            Action::Exit(ExitReason::StopLoss)
        );
        assert_eq!(
            decide(PositionState::ShortSpread, z(3.6), false, &T),
            Action::Exit(ExitReason::StopLoss)
        );
    }

    #[test]
    fn reversion_beats_end_of_data() {
        assert_eq!(
            decide(PositionState::ShortSpread, z(0.1), true, &T),
            Action::Exit(ExitReason::MeanReversion)
        );
        assert_eq!(
            decide(PositionState::ShortSpread, z(1.5), true, &T),
            Action::Exit(ExitReason::EndOfData)
        );
    }

    #[test]
    fn undefined_z_forces_flat() {
        let u = Reading::Undefined(Undefined::ZeroVariance);
        assert_eq!(decide(PositionState::Flat, u, false, &T), Action::Hold);
        assert_eq!(
            decide(PositionState::LongSpread, u, false, &T),
            Action::Exit(ExitReason::DataQuality)
        );
    }

    #[test]
    fn apply_never_flips_directly() {
        let s = Action::Exit(ExitReason::MeanReversion).apply(PositionState::LongSpread);
        assert_eq!(s, PositionState::Flat);
        assert_eq!(
            Action::Enter(Direction::Short).apply(PositionState::Flat),
            PositionState::ShortSpread
        );
        assert_eq!(Action::Hold.apply(PositionState::ShortSpread), PositionState::ShortSpread);
    }
}

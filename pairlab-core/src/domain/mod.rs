//! Domain types for PairLab

pub mod equity;
pub mod position;
pub mod reading;
pub mod series;
pub mod trade;

pub use equity::EquityCurve;
pub use position::{Direction, PositionState};
pub use reading::{Reading, Undefined};
pub use series::{align_pair, align_to_index, GapPolicy, PairCandidate, PriceSeries, PriceSeriesStore};
pub use trade::{ExitReason, Trade};

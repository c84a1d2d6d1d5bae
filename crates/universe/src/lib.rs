//! Universe selection: volume-ranked instrument set minus the
//! capitalization-ranked exclusion set.

mod exclusion;
mod ranker;

pub use exclusion::{run_exclusion_loop, ExclusionRefresher, ExclusionState};
pub use ranker::{RankerConfig, UniverseRanker};

use market_data::MarketDataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    /// The provider was unreachable or its payload malformed. The caller
    /// keeps the previous snapshot; this never tears anything down.
    #[error("ranking data unavailable: {0}")]
    DataUnavailable(#[from] MarketDataError),
}

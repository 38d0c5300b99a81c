//! Result types, deduplication and ranking
//!
//! Raw provider results are folded into canonical records by the [`Merger`]
//! and then weighted and ordered by the [`Ranker`].

mod merger;
mod ranker;
mod types;
pub mod url;

pub use merger::{merge, Merger, DEFAULT_TRUST};
pub use ranker::{
    compare, duplication_bonus, freshness_factor, position_score, rank, Ranker,
};
pub use types::*;

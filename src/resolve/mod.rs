//! Ranking of candidates into one payable figure, the component set, and
//! the retention amount.

mod retention;
mod total;

pub use retention::resolve_retention;
pub use total::{
    RankedCandidate, has_net_total_field, ranked_payable_candidates, resolve_components,
    resolve_payable,
};

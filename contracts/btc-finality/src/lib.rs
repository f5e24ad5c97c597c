mod finality;
mod governance;
mod liveness;
mod power_dist;

pub mod collaborators;
pub mod contract;
pub mod error;
pub mod events;
pub mod genesis;
pub mod msg;
pub mod queries;
pub mod signing_context;
pub mod state;

#[cfg(test)]
mod multitest;
#[cfg(test)]
pub(crate) mod test_utils;

pub use finality::{index_block, is_finality_active, reward_blocks, tally_blocks};
pub use liveness::handle_liveness;
pub use power_dist::record_voting_power_and_cache;

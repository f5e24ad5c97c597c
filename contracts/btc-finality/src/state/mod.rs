use std::collections::BTreeSet;

use crate::error::ContractError;

pub mod config;
pub mod finality;
pub mod liveness;
pub mod public_randomness;
pub mod voting_power;

pub(crate) const BLOCKS_NAMESPACE: &str = "blocks";
pub(crate) const VOTES_NAMESPACE: &str = "votes";
pub(crate) const PUB_RAND_NAMESPACE: &str = "pub_rand";
pub(crate) const PUB_RAND_COMMIT_NAMESPACE: &str = "pub_rand_commit";
pub(crate) const PUB_RAND_COMMIT_INDEX_NAMESPACE: &str = "pub_rand_commit_index";
pub(crate) const EVIDENCES_NAMESPACE: &str = "evidences";
pub(crate) const VOTING_POWER_NAMESPACE: &str = "voting_power";
pub(crate) const VP_DIST_CACHE_NAMESPACE: &str = "vp_dist_cache";
pub(crate) const SIGNING_INFO_NAMESPACE: &str = "signing_info";
pub(crate) const MISSED_BITMAP_NAMESPACE: &str = "missed_bitmap";
pub(crate) const NEXT_HEIGHT_TO_FINALIZE_NAMESPACE: &str = "next_height_to_finalize";
pub(crate) const NEXT_HEIGHT_TO_REWARD_NAMESPACE: &str = "next_height_to_reward";
pub(crate) const PARAMS_NAMESPACE: &str = "params";
pub(crate) const ADMIN_NAMESPACE: &str = "admin";

/// Every storage namespace used by the module
pub(crate) const NAMESPACES: [&str; 14] = [
    BLOCKS_NAMESPACE,
    VOTES_NAMESPACE,
    PUB_RAND_NAMESPACE,
    PUB_RAND_COMMIT_NAMESPACE,
    PUB_RAND_COMMIT_INDEX_NAMESPACE,
    EVIDENCES_NAMESPACE,
    VOTING_POWER_NAMESPACE,
    VP_DIST_CACHE_NAMESPACE,
    SIGNING_INFO_NAMESPACE,
    MISSED_BITMAP_NAMESPACE,
    NEXT_HEIGHT_TO_FINALIZE_NAMESPACE,
    NEXT_HEIGHT_TO_REWARD_NAMESPACE,
    PARAMS_NAMESPACE,
    ADMIN_NAMESPACE,
];

/// Fails on the first namespace that is used twice
pub(crate) fn check_namespaces(namespaces: &[&str]) -> Result<(), ContractError> {
    let mut seen = BTreeSet::new();
    for ns in namespaces {
        if !seen.insert(*ns) {
            return Err(ContractError::DuplicateNamespace(ns.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_unique() {
        check_namespaces(&NAMESPACES).unwrap();
        assert_eq!(
            check_namespaces(&["blocks", "votes", "blocks"]),
            Err(ContractError::DuplicateNamespace("blocks".to_string()))
        );
    }
}

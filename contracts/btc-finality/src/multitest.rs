mod suite;

use suite::SuiteBuilder;

use crate::error::ContractError;
use crate::state::config::Params;

// 2 BTC
const STAKE: u64 = 200_000_000;

mod finalization {
    use super::*;

    use crate::test_utils::finality_params;

    #[test]
    fn single_finality_provider_finalizes_its_blocks() {
        let mut suite = SuiteBuilder::new()
            .with_finality_provider("alice", STAKE)
            .build();
        suite.commit_pub_rand("alice", 1, 100).unwrap();

        suite.advance_to(5, &["alice"]);

        assert_eq!(suite.get_cursors().next_height_to_finalize, 6);
        for height in 1..=5 {
            let block = suite.get_indexed_block(height);
            assert!(block.finalized, "block {height} is not finalized");
            assert_eq!(block.app_hash, suite::Suite::app_hash(height));
        }
        assert_eq!(suite.get_votes(3).btc_pks, vec![suite.pk("alice")]);

        // Rewards lag behind by the signature timeout, and prune the rewarded caches
        assert_eq!(suite.incentive.rewarded_heights(), vec![1, 2]);
        assert_eq!(suite.get_cursors().next_height_to_reward, 3);
        assert_eq!(suite.get_dist_cache(2), None);
        assert!(suite.get_dist_cache(3).is_some());
    }

    #[test]
    fn single_value_commits_are_enough_to_vote() {
        let mut suite = SuiteBuilder::new()
            .with_params(finality_params())
            .with_finality_provider("alice", STAKE)
            .build();

        // Each commit holds one value, so each proof is a bare leaf
        for height in 1..=2 {
            suite.commit_pub_rand("alice", height, 1).unwrap();
            suite.begin_block().unwrap();
            assert_eq!(suite.height(), height);
            suite.vote("alice", height).unwrap();
            suite.end_block().unwrap();

            assert!(suite.get_indexed_block(height).finalized);
            assert_eq!(suite.get_cursors().next_height_to_finalize, height + 1);
        }
    }

    #[test]
    fn votes_for_future_blocks_are_rejected() {
        let mut suite = SuiteBuilder::new()
            .with_finality_provider("alice", STAKE)
            .build();
        suite.commit_pub_rand("alice", 1, 100).unwrap();
        suite.advance_to(2, &["alice"]);

        // No voting power is recorded for a height that is not reached yet
        assert_eq!(
            suite.vote("alice", 3).unwrap_err(),
            ContractError::NoVotingPower(suite.pk("alice"), 3)
        );

        // A duplicate vote is accepted, and changes nothing
        let res = suite.vote("alice", 2).unwrap();
        assert!(res.events.is_empty());
    }

    #[test]
    fn quorum_needs_more_than_two_thirds() {
        let mut suite = SuiteBuilder::new()
            .with_params(Params {
                finality_activation_height: 10,
                ..Params::default()
            })
            .with_finality_provider("alice", STAKE)
            .with_finality_provider("bob", STAKE)
            .build();
        suite.commit_pub_rand("alice", 10, 100).unwrap();
        suite.commit_pub_rand("bob", 10, 100).unwrap();
        suite.advance_to(9, &[]);

        // Only alice votes at 10: 50% of the voting power
        suite.advance_to(10, &["alice"]);
        assert!(!suite.get_indexed_block(10).finalized);
        assert_eq!(suite.get_cursors().next_height_to_finalize, 10);

        // A full quorum at 11 does not finalize 10
        suite.advance_to(11, &["alice", "bob"]);
        assert!(!suite.get_indexed_block(10).finalized);
        assert!(!suite.get_indexed_block(11).finalized);
        assert_eq!(suite.get_cursors().next_height_to_finalize, 10);

        // The missing vote for 10 finalizes both
        suite.begin_block().unwrap();
        suite.vote("bob", 10).unwrap();
        suite.end_block().unwrap();
        assert!(suite.get_indexed_block(10).finalized);
        assert!(suite.get_indexed_block(11).finalized);
        assert!(!suite.get_indexed_block(12).finalized);
        assert_eq!(suite.get_cursors().next_height_to_finalize, 12);
    }
}

mod slashing {
    use super::*;

    use crate::signing_context::msg_to_sign;

    #[test]
    fn equivocation_slashes_the_finality_provider() {
        let mut suite = SuiteBuilder::new()
            .with_finality_provider("alice", STAKE)
            .build();
        suite.commit_pub_rand("alice", 1, 100).unwrap();
        suite.advance_to(2, &["alice"]);

        suite.begin_block().unwrap();
        let app_hash_a = suite::Suite::app_hash(3);
        let app_hash_b = vec![0xff; 32];
        suite.vote_for("alice", 3, &app_hash_a).unwrap();
        let res = suite.vote_for("alice", 3, &app_hash_b).unwrap();
        assert!(res
            .events
            .iter()
            .any(|ev| ev.ty == "slashed_finality_provider"));

        let pk_hex = suite.pk("alice");
        let evidence = suite.get_evidence("alice", 3).evidence.unwrap();
        assert_eq!(evidence.canonical_app_hash, app_hash_a);
        assert_eq!(evidence.fork_app_hash, app_hash_b);
        assert_eq!(
            evidence.canonical_finality_sig,
            suite.get_finality_signature("alice", 3).signature
        );
        assert!(!evidence.fork_finality_sig.is_empty());
        assert!(suite.staking.finality_providers[&pk_hex].slashed_babylon_height > 0);

        // The next distribution drops the slashed finality provider
        suite.end_block().unwrap();
        suite.begin_block().unwrap();
        let dc = suite.get_dist_cache(4).unwrap();
        assert!(dc.finality_providers.iter().all(|fp| fp.btc_pk_hex != pk_hex));
        assert!(suite
            .get_active_finality_providers(4)
            .finality_providers
            .is_empty());

        // Anyone can recover the secret key out of the evidence
        let context = suite.signing_context();
        let pk = eots::PublicKey::from_hex(&pk_hex).unwrap();
        let sk = pk
            .extract_secret_key(
                &evidence.pub_rand,
                &msg_to_sign(&context, 3, &evidence.canonical_app_hash),
                &evidence.canonical_finality_sig,
                &msg_to_sign(&context, 3, &evidence.fork_app_hash),
                &evidence.fork_finality_sig,
            )
            .unwrap();
        assert_eq!(sk.pubkey().to_hex(), pk_hex);
        let sec_rand = eots::new_sec_rand(&[7u8; 32]).unwrap();
        let msg = [9u8; 32];
        let sig = sk.sign(&sec_rand, &msg);
        assert!(pk.verify(&eots::pub_rand_from_sec_rand(&sec_rand), &msg, &sig));
    }

    #[test]
    fn fork_vote_before_canonical_vote_slashes_too() {
        let mut suite = SuiteBuilder::new()
            .with_finality_provider("alice", STAKE)
            .build();
        suite.commit_pub_rand("alice", 1, 100).unwrap();
        suite.advance_to(1, &["alice"]);

        suite.begin_block().unwrap();
        suite.vote_for("alice", 2, &[0xaa; 32]).unwrap();
        let evidence = suite.get_evidence("alice", 2).evidence.unwrap();
        assert!(evidence.canonical_finality_sig.is_empty());
        assert_eq!(
            suite.staking.finality_providers[&suite.pk("alice")].slashed_babylon_height,
            0
        );

        suite.vote("alice", 2).unwrap();
        let evidence = suite.get_evidence("alice", 2).evidence.unwrap();
        assert!(!evidence.canonical_finality_sig.is_empty());
        assert_eq!(
            suite.staking.finality_providers[&suite.pk("alice")].slashed_babylon_height,
            2
        );
    }
}

mod liveness {
    use super::*;

    #[test]
    fn inactive_finality_provider_gets_jailed() {
        let mut suite = SuiteBuilder::new()
            .with_finality_provider("alice", STAKE)
            .build();
        suite.commit_pub_rand("alice", 1, 200).unwrap();
        let pk_hex = suite.pk("alice");

        // Signs 1, misses 2..=52 and signs 53..=101
        suite.advance_to(1, &["alice"]);
        suite.advance_to(52, &[]);
        suite.advance_to(101, &["alice"]);
        // Heights up to 101 are examined by the end of 104
        suite.advance_to(104, &[]);

        // 51 misses out of the window, but the first window is not over yet
        let info = suite.get_signing_info("alice").unwrap();
        assert_eq!(info.start_height, 1);
        assert_eq!(info.missed_blocks_counter, 51);
        assert_eq!(suite.get_missed_blocks("alice").indices.len(), 51);
        assert!(!suite.staking.finality_providers[&pk_hex].jailed);

        // Height 102 is examined at 105
        suite.begin_block().unwrap();
        let res = suite.end_block().unwrap();
        assert!(res.events.iter().any(|ev| ev.ty == "jailed_finality_provider"));
        assert!(suite.staking.finality_providers[&pk_hex].jailed);

        let info = suite.get_signing_info("alice").unwrap();
        assert_eq!(info.missed_blocks_counter, 0);
        assert_eq!(info.jailed_until, suite.block_time().plus_seconds(86400));
        assert!(suite.get_missed_blocks("alice").indices.is_empty());

        // The jailed finality provider leaves the active set at the next block
        suite.begin_block().unwrap();
        assert!(suite
            .get_active_finality_providers(suite.height())
            .finality_providers
            .is_empty());
    }

    #[test]
    fn unjail_after_the_jail_period() {
        let mut suite = SuiteBuilder::new()
            .with_params(Params {
                jail_duration: 10,
                ..Params::default()
            })
            .with_finality_provider("alice", STAKE)
            .build();
        suite.commit_pub_rand("alice", 1, 100).unwrap();
        suite.advance_to(3, &["alice"]);

        let pk_hex = suite.pk("alice");
        let fp_addr = cosmwasm_std::Addr::unchecked(suite.fp("alice").addr.clone());
        let unjail = crate::msg::ExecuteMsg::UnjailFinalityProvider {
            fp_btc_pk_hex: pk_hex.clone(),
        };
        assert_eq!(
            suite.execute(&fp_addr, unjail.clone()).unwrap_err(),
            ContractError::FinalityProviderNotJailed(pk_hex.clone())
        );

        // Governance jails alice for stalling at height 4
        suite.begin_block().unwrap();
        suite.resume_finality(&["alice"], 4).unwrap();
        suite.end_block().unwrap();
        assert!(suite.staking.finality_providers[&pk_hex].jailed);
        assert_eq!(
            suite.execute(&cosmwasm_std::Addr::unchecked("mallory"), unjail.clone()),
            Err(ContractError::Unauthorized)
        );
        let jailed_until = suite.get_signing_info("alice").unwrap().jailed_until;
        assert_eq!(
            suite.execute(&fp_addr, unjail.clone()).unwrap_err(),
            ContractError::JailPeriodNotPassed(pk_hex.clone(), jailed_until)
        );

        // Two blocks later the jail period is over
        suite.advance_to(6, &[]);
        suite.execute(&fp_addr, unjail).unwrap();
        assert!(!suite.staking.finality_providers[&pk_hex].jailed);

        // Back in the active set at the next block
        suite.begin_block().unwrap();
        let active = suite.get_active_finality_providers(suite.height());
        assert_eq!(active.finality_providers.len(), 1);
    }
}

mod governance {
    use super::*;

    #[test]
    fn resume_finality_unblocks_a_stalled_chain() {
        let mut suite = SuiteBuilder::new()
            .with_params(Params {
                finality_activation_height: 95,
                ..Params::default()
            })
            .with_finality_provider("alice", STAKE)
            .with_finality_provider("bob", STAKE)
            .with_finality_provider("carol", STAKE)
            .build();
        for name in ["alice", "bob", "carol"] {
            suite.commit_pub_rand(name, 95, 100).unwrap();
        }
        suite.advance_to(94, &[]);
        suite.advance_to(99, &["alice", "bob", "carol"]);
        // bob and carol go offline at 100
        suite.advance_to(109, &["alice"]);
        assert_eq!(suite.get_cursors().next_height_to_finalize, 100);

        suite.begin_block().unwrap();
        suite.vote("alice", 110).unwrap();

        // Only the admin can resume finality
        assert_eq!(
            suite.execute(
                &cosmwasm_std::Addr::unchecked("anyone"),
                crate::msg::ExecuteMsg::ResumeFinality {
                    fp_pks_hex: vec![suite.pk("bob")],
                    halting_height: 100,
                },
            ),
            Err(ContractError::Admin(cw_controllers::AdminError::NotAdmin {}))
        );
        // alice voted at the halting height
        assert_eq!(
            suite.resume_finality(&["alice"], 100).unwrap_err(),
            ContractError::FinalityProviderVotedAtHaltingHeight(suite.pk("alice"), 100)
        );

        suite.resume_finality(&["bob", "carol"], 100).unwrap();
        for name in ["bob", "carol"] {
            assert!(suite.staking.finality_providers[&suite.pk(name)].jailed);
        }
        for height in 100..=110 {
            let dc = suite.get_dist_cache(height).unwrap();
            assert_eq!(dc.num_active_fps, 1);
            assert_eq!(dc.total_voting_power, STAKE);
            let active = suite.get_active_finality_providers(height).finality_providers;
            assert_eq!(active.len(), 1);
            assert_eq!(active[0].btc_pk_hex, suite.pk("alice"));
        }
        // Heights before the halting height are untouched
        assert_eq!(
            suite.get_active_finality_providers(99).finality_providers.len(),
            3
        );

        suite.end_block().unwrap();
        for height in 100..=110 {
            assert!(suite.get_indexed_block(height).finalized);
        }
        assert_eq!(suite.get_cursors().next_height_to_finalize, 111);
    }
}

mod public_randomness {
    use super::*;

    use crate::msg::ExecuteMsg;

    #[test]
    fn proof_over_a_different_total_is_rejected() {
        let mut suite = SuiteBuilder::new()
            .with_finality_provider("alice", STAKE)
            .build();
        suite.commit_pub_rand("alice", 50, 100).unwrap();
        suite.advance_to(59, &[]);
        suite.begin_block().unwrap();

        let app_hash = suite::Suite::app_hash(60);
        let mut msg = suite.finality_sig_msg("alice", 60, &app_hash);
        if let ExecuteMsg::AddFinalitySig { proof, .. } = &mut msg {
            proof.total = 99;
        }
        let anyone = cosmwasm_std::Addr::unchecked("anyone");
        let err = suite.execute(&anyone, msg).unwrap_err();
        assert!(matches!(err, ContractError::InvalidPubRand(_)));

        assert!(suite.get_finality_signature("alice", 60).signature.is_empty());
        assert!(suite.get_votes(60).btc_pks.is_empty());

        // The genuine proof goes through
        suite.vote("alice", 60).unwrap();
        assert_eq!(suite.get_votes(60).btc_pks, vec![suite.pk("alice")]);
    }

    #[test]
    fn commits_must_not_overlap() {
        let mut suite = SuiteBuilder::new()
            .with_finality_provider("alice", STAKE)
            .build();
        suite.commit_pub_rand("alice", 1, 100).unwrap();
        assert_eq!(
            suite.commit_pub_rand("alice", 100, 100).unwrap_err(),
            ContractError::InvalidPubRandHeight(100, 100)
        );
        assert_eq!(
            suite.commit_pub_rand("alice", 101, 10).unwrap_err(),
            ContractError::TooFewPubRand(10, 100)
        );
        suite.commit_pub_rand("alice", 101, 100).unwrap();
    }
}

use std::collections::BTreeMap;

use cosmwasm_std::testing::{
    message_info, mock_dependencies, mock_env, MockApi, MockQuerier, MockStorage,
};
use cosmwasm_std::{from_json, Addr, Env, OwnedDeps, Response, Timestamp};
use derivative::Derivative;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use babylon_apis::finality_api::{
    FinalityProviderSigningInfo, IndexedBlock, VotingPowerDistCache,
};

use crate::collaborators::Collaborators;
use crate::contract;
use crate::error::ContractError;
use crate::msg::{
    ActiveFinalityProvidersResponse, CursorsResponse, EvidenceResponse, ExecuteMsg,
    FinalitySignatureResponse, InstantiateMsg, MissedBlocksResponse, QueryMsg, SudoMsg,
    VotesResponse,
};
use crate::signing_context::fp_fin_vote_context_v0;
use crate::state::config::Params;
use crate::test_utils::{
    MockEpoching, MockIncentive, MockStaking, PubRandList, TestFinalityProvider,
};

#[derive(Derivative)]
#[derivative(Default = "new")]
pub struct SuiteBuilder {
    params: Params,
    /// Finality providers by name, with the sats delegated to them
    finality_providers: Vec<(String, u64)>,
}

impl SuiteBuilder {
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_finality_provider(mut self, name: &str, total_sat: u64) -> Self {
        self.finality_providers.push((name.to_string(), total_sat));
        self
    }

    #[track_caller]
    pub fn build(self) -> Suite {
        let mut deps = mock_dependencies();
        let admin = deps.api.addr_make("admin");
        let mut env = mock_env();
        env.block.height = 0;

        let info = message_info(&deps.api.addr_make("creator"), &[]);
        contract::instantiate(
            deps.as_mut(),
            env.clone(),
            info,
            InstantiateMsg {
                params: Some(self.params),
                admin: Some(admin.to_string()),
                genesis: None,
            },
        )
        .unwrap();

        let mut staking = MockStaking::default();
        let mut fps = BTreeMap::new();
        for (name, total_sat) in self.finality_providers {
            let fp = TestFinalityProvider::new(&name);
            staking.add_finality_provider(fp.finality_provider());
            staking.delegate(&format!("{name}-del"), &fp.btc_pk_hex, total_sat);
            fps.insert(name, fp);
        }

        Suite {
            deps,
            env,
            staking,
            // Every commit is made in epoch 1, which is already checkpointed
            epoching: MockEpoching::new(1, 1),
            incentive: MockIncentive::default(),
            admin,
            fps,
            commits: BTreeMap::new(),
        }
    }
}

pub struct Suite {
    deps: OwnedDeps<MockStorage, MockApi, MockQuerier>,
    env: Env,
    pub staking: MockStaking,
    pub epoching: MockEpoching,
    pub incentive: MockIncentive,
    /// Governance authority
    pub admin: Addr,
    fps: BTreeMap<String, TestFinalityProvider>,
    /// Last public randomness list committed by each finality provider
    commits: BTreeMap<String, PubRandList>,
}

impl Suite {
    pub fn height(&self) -> u64 {
        self.env.block.height
    }

    pub fn block_time(&self) -> Timestamp {
        self.env.block.time
    }

    #[track_caller]
    pub fn fp(&self, name: &str) -> &TestFinalityProvider {
        &self.fps[name]
    }

    pub fn pk(&self, name: &str) -> String {
        self.fp(name).btc_pk_hex.clone()
    }

    /// Signing context of finality votes for this chain and module
    pub fn signing_context(&self) -> String {
        fp_fin_vote_context_v0(&self.env.block.chain_id, self.env.contract.address.as_str())
    }

    /// The app hash of the canonical block at `height`
    pub fn app_hash(height: u64) -> Vec<u8> {
        Sha256::digest(format!("block-{height}")).to_vec()
    }

    fn sudo(&mut self, msg: SudoMsg) -> Result<Response, ContractError> {
        let mut collaborators = Collaborators {
            staking: &mut self.staking,
            epoching: &self.epoching,
            incentive: &mut self.incentive,
        };
        contract::sudo(self.deps.as_mut(), self.env.clone(), msg, &mut collaborators)
    }

    pub fn execute(&mut self, sender: &Addr, msg: ExecuteMsg) -> Result<Response, ContractError> {
        let info = message_info(sender, &[]);
        let mut collaborators = Collaborators {
            staking: &mut self.staking,
            epoching: &self.epoching,
            incentive: &mut self.incentive,
        };
        contract::execute(
            self.deps.as_mut(),
            self.env.clone(),
            info,
            msg,
            &mut collaborators,
        )
    }

    /// Moves to the next block and runs its begin block hook
    pub fn begin_block(&mut self) -> Result<Response, ContractError> {
        self.env.block.height += 1;
        self.env.block.time = self.env.block.time.plus_seconds(5);
        let height = self.env.block.height;
        let res = self.sudo(SudoMsg::BeginBlock {
            app_hash_hex: hex::encode(Self::app_hash(height)),
        });
        self.staking.index_btc_height(height);
        res
    }

    pub fn end_block(&mut self) -> Result<Response, ContractError> {
        self.sudo(SudoMsg::EndBlock {})
    }

    /// Runs blocks up to `height`, with `voters` voting for every canonical block
    #[track_caller]
    pub fn advance_to(&mut self, height: u64, voters: &[&str]) {
        while self.height() < height {
            self.begin_block().unwrap();
            let current = self.height();
            for voter in voters {
                self.vote(voter, current).unwrap();
            }
            self.end_block().unwrap();
        }
    }

    pub fn commit_pub_rand(
        &mut self,
        name: &str,
        start_height: u64,
        num_pub_rand: u64,
    ) -> Result<Response, ContractError> {
        let list = self.fp(name).pub_rand_list(start_height, num_pub_rand);
        let msg = ExecuteMsg::CommitPubRandList {
            fp_btc_pk_hex: self.pk(name),
            start_height,
            num_pub_rand,
            commitment: list.commitment.clone().into(),
            signature: list.signature.clone().into(),
        };
        let res = self.execute(&Addr::unchecked("anyone"), msg)?;
        self.commits.insert(name.to_string(), list);
        Ok(res)
    }

    /// Vote of `name` for `app_hash` at `height`, using its last committed randomness
    #[track_caller]
    pub fn finality_sig_msg(&self, name: &str, height: u64, app_hash: &[u8]) -> ExecuteMsg {
        let fp = self.fp(name);
        let (pub_rand, proof) = self.commits[name].pub_rand_and_proof(height);
        let signature = fp.finality_sig(&self.signing_context(), height, app_hash);
        ExecuteMsg::AddFinalitySig {
            fp_btc_pk_hex: fp.btc_pk_hex.clone(),
            height,
            pub_rand: pub_rand.into(),
            proof,
            block_app_hash: app_hash.to_vec().into(),
            signature: signature.into(),
        }
    }

    pub fn vote(&mut self, name: &str, height: u64) -> Result<Response, ContractError> {
        self.vote_for(name, height, &Self::app_hash(height))
    }

    pub fn vote_for(
        &mut self,
        name: &str,
        height: u64,
        app_hash: &[u8],
    ) -> Result<Response, ContractError> {
        let msg = self.finality_sig_msg(name, height, app_hash);
        self.execute(&Addr::unchecked("anyone"), msg)
    }

    pub fn resume_finality(
        &mut self,
        names: &[&str],
        halting_height: u64,
    ) -> Result<Response, ContractError> {
        let msg = ExecuteMsg::ResumeFinality {
            fp_pks_hex: names.iter().map(|name| self.pk(name)).collect(),
            halting_height,
        };
        let admin = self.admin.clone();
        self.execute(&admin, msg)
    }

    #[track_caller]
    fn query<T: DeserializeOwned>(&self, msg: QueryMsg) -> T {
        from_json(contract::query(self.deps.as_ref(), self.env.clone(), msg).unwrap()).unwrap()
    }

    #[track_caller]
    pub fn get_indexed_block(&self, height: u64) -> IndexedBlock {
        self.query(QueryMsg::Block { height })
    }

    #[track_caller]
    pub fn get_cursors(&self) -> CursorsResponse {
        self.query(QueryMsg::Cursors {})
    }

    #[track_caller]
    pub fn get_votes(&self, height: u64) -> VotesResponse {
        self.query(QueryMsg::Votes { height })
    }

    #[track_caller]
    pub fn get_finality_signature(&self, name: &str, height: u64) -> FinalitySignatureResponse {
        self.query(QueryMsg::FinalitySignature {
            btc_pk_hex: self.pk(name),
            height,
        })
    }

    #[track_caller]
    pub fn get_evidence(&self, name: &str, height: u64) -> EvidenceResponse {
        self.query(QueryMsg::Evidence {
            btc_pk_hex: self.pk(name),
            height,
        })
    }

    #[track_caller]
    pub fn get_dist_cache(&self, height: u64) -> Option<VotingPowerDistCache> {
        self.query(QueryMsg::VotingPowerDistCache { height })
    }

    #[track_caller]
    pub fn get_active_finality_providers(&self, height: u64) -> ActiveFinalityProvidersResponse {
        self.query(QueryMsg::ActiveFinalityProviders { height })
    }

    #[track_caller]
    pub fn get_signing_info(&self, name: &str) -> Option<FinalityProviderSigningInfo> {
        self.query(QueryMsg::SigningInfo {
            btc_pk_hex: self.pk(name),
        })
    }

    #[track_caller]
    pub fn get_missed_blocks(&self, name: &str) -> MissedBlocksResponse {
        self.query(QueryMsg::MissedBlocks {
            btc_pk_hex: self.pk(name),
        })
    }
}

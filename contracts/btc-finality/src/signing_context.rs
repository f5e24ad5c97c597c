use sha2::{Digest, Sha256};

const PROTOCOL_NAME: &str = "btcstaking";
const VERSION_V0: &str = "0";
const FP_FIN_VOTE: &str = "fp_fin_vote";

/// Hex encoded context finality votes are bound to, so that a vote cannot be replayed on
/// another chain or against another deployment of the module
pub fn fp_fin_vote_context_v0(chain_id: &str, address: &str) -> String {
    let tag = format!("{PROTOCOL_NAME}/{VERSION_V0}/{FP_FIN_VOTE}/{chain_id}/{address}");
    hex::encode(Sha256::digest(tag.as_bytes()))
}

/// `msg_to_sign` returns the hash an EOTS finality signature signs for the given block
pub fn msg_to_sign(context: &str, height: u64, app_hash: &[u8]) -> [u8; 32] {
    Sha256::new()
        .chain_update(context.as_bytes())
        .chain_update(height.to_be_bytes())
        .chain_update(app_hash)
        .finalize()
        .into()
}

/// Message the finality provider signs (BIP-340) when committing public randomness
pub fn commit_pub_rand_msg(start_height: u64, num_pub_rand: u64, commitment: &[u8]) -> Vec<u8> {
    let mut msg = start_height.to_be_bytes().to_vec();
    msg.extend_from_slice(&num_pub_rand.to_be_bytes());
    msg.extend_from_slice(commitment);
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_chain_bound() {
        let ctx = fp_fin_vote_context_v0("bbn-1", "addr");
        assert_eq!(ctx.len(), 64);
        assert_eq!(
            ctx,
            hex::encode(Sha256::digest(b"btcstaking/0/fp_fin_vote/bbn-1/addr"))
        );
        assert_ne!(ctx, fp_fin_vote_context_v0("bbn-2", "addr"));
        assert_ne!(
            msg_to_sign(&ctx, 1, &[0; 32]),
            msg_to_sign(&ctx, 2, &[0; 32])
        );
    }
}

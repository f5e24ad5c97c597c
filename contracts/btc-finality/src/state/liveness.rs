use cosmwasm_std::Order::Ascending;
use cosmwasm_std::{StdResult, Storage};
use cw_storage_plus::Map;

use babylon_apis::finality_api::FinalityProviderSigningInfo;

use crate::state::{MISSED_BITMAP_NAMESPACE, SIGNING_INFO_NAMESPACE};

/// Liveness bookkeeping by FP
pub const SIGNING_INFO: Map<&str, FinalityProviderSigningInfo> = Map::new(SIGNING_INFO_NAMESPACE);

/// Missed blocks bitmap by FP and chunk index. Bit `i` of the window lives in chunk
/// `i / CHUNK_BITS`, at position `i % CHUNK_BITS`
pub const MISSED_BITMAP: Map<(&str, u64), u64> = Map::new(MISSED_BITMAP_NAMESPACE);

const CHUNK_BITS: u64 = u64::BITS as u64;

pub fn get_missed_block_bit(
    storage: &dyn Storage,
    fp_btc_pk_hex: &str,
    index: u64,
) -> StdResult<bool> {
    let chunk = MISSED_BITMAP
        .may_load(storage, (fp_btc_pk_hex, index / CHUNK_BITS))?
        .unwrap_or_default();
    Ok(chunk & (1 << (index % CHUNK_BITS)) != 0)
}

pub fn set_missed_block_bit(
    storage: &mut dyn Storage,
    fp_btc_pk_hex: &str,
    index: u64,
    missed: bool,
) -> StdResult<()> {
    let key = (fp_btc_pk_hex, index / CHUNK_BITS);
    let chunk = MISSED_BITMAP.may_load(storage, key)?.unwrap_or_default();
    let mask = 1 << (index % CHUNK_BITS);
    let chunk = if missed { chunk | mask } else { chunk & !mask };
    // empty chunks are not stored
    if chunk == 0 {
        MISSED_BITMAP.remove(storage, key);
        Ok(())
    } else {
        MISSED_BITMAP.save(storage, key, &chunk)
    }
}

pub fn clear_missed_blocks(storage: &mut dyn Storage, fp_btc_pk_hex: &str) -> StdResult<()> {
    let chunks = MISSED_BITMAP
        .prefix(fp_btc_pk_hex)
        .keys(storage, None, None, Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for chunk in chunks {
        MISSED_BITMAP.remove(storage, (fp_btc_pk_hex, chunk));
    }
    Ok(())
}

/// Window indices of the blocks `fp_btc_pk_hex` missed, in increasing order
pub fn missed_block_indices(storage: &dyn Storage, fp_btc_pk_hex: &str) -> StdResult<Vec<u64>> {
    let mut indices = vec![];
    for item in MISSED_BITMAP
        .prefix(fp_btc_pk_hex)
        .range(storage, None, None, Ascending)
    {
        let (chunk_index, chunk) = item?;
        indices.extend(
            (0..CHUNK_BITS)
                .filter(|bit| chunk & (1 << bit) != 0)
                .map(|bit| chunk_index * CHUNK_BITS + bit),
        );
    }
    Ok(indices)
}

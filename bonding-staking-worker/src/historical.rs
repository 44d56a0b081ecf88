// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::state::StakingState;
use bonding_db_exports::HISTORICAL_INFO_PREFIX;
use bonding_staking_exports::keys::historical_info_key;
use bonding_staking_exports::{ExecutionContext, HistoricalInfo, StakingResult};

const HISTORICAL_INFO_DESER_ERROR: &str = "critical: historical info deserialization failed";
const HISTORICAL_INFO_SER_ERROR: &str = "critical: historical info serialization failed";

impl StakingState {
    /// Header and active set recorded at `height`, if still retained
    pub fn get_historical_info(
        &self,
        ctx: &ExecutionContext,
        height: u64,
    ) -> StakingResult<Option<HistoricalInfo>> {
        ctx.get_decoded(
            &historical_info_key(height),
            &self.historical_deserializer,
            HISTORICAL_INFO_DESER_ERROR,
        )
    }

    /// Records the current header and the last active set, keeping only the
    /// `historical_entries` most recent heights.
    pub fn track_historical_info(&self, ctx: &mut ExecutionContext) -> StakingResult<()> {
        let entries = self.config.historical_entries as u64;
        let height = ctx.block_height();
        if let Some(prune_height) = height.checked_sub(entries) {
            let stale = ctx.tx.range_entries(
                HISTORICAL_INFO_PREFIX.as_bytes(),
                &historical_info_key(prune_height),
            )?;
            for (key, _) in stale {
                ctx.tx.delete(key);
            }
        }
        if entries == 0 {
            return Ok(());
        }

        let info = HistoricalInfo {
            header: ctx.header,
            validators: self.get_last_validators(ctx)?,
        };
        ctx.put_encoded(
            historical_info_key(height),
            &info,
            &self.historical_serializer,
            HISTORICAL_INFO_SER_ERROR,
        )
    }
}

use async_trait::async_trait;
use ethers::prelude::Address;
use log::debug;
use std::sync::Arc;

use crate::chain_reader::{ContractReader, ReadError};
use crate::contracts::{cl_pool, cl_strategy};
use crate::normalization::PositionValue;
use crate::range_adapter::RangeAdapter;

/// Tick adapter: the active tick comes from the pool's `slot0()`, the tick
/// range from the strategy contract.
#[derive(Clone)]
pub struct ConcentratedLiquidityAdapter {
    pool_address: Address,
    strategy_address: Address,
    reader: Arc<dyn ContractReader>,
}

impl ConcentratedLiquidityAdapter {
    pub fn new(pool_address: Address, strategy_address: Address, reader: Arc<dyn ContractReader>) -> Self {
        Self { pool_address, strategy_address, reader }
    }
}

#[async_trait]
impl RangeAdapter for ConcentratedLiquidityAdapter {
    fn name(&self) -> &'static str {
        "ConcentratedLiquidity"
    }

    async fn read_active_position(&self) -> Result<i128, ReadError> {
        let data = self.reader.call(&cl_pool::slot0(self.pool_address)).await?;
        let slot = cl_pool::decode_slot0_v1(&data)?;
        debug!(
            "CL pool {:?} tick {} (slot0 layout v{})",
            self.pool_address,
            slot.tick,
            cl_pool::SLOT0_LAYOUT_VERSION
        );
        Ok(PositionValue::from(slot.tick).to_i128()?)
    }

    async fn read_bounds(&self) -> Result<(i128, i128), ReadError> {
        let data = self.reader.call(&cl_strategy::get_range(self.strategy_address)).await?;
        let (lower, upper) = cl_strategy::decode_tick_range(&data)?;
        Ok((
            PositionValue::from(lower).to_i128()?,
            PositionValue::from(upper).to_i128()?,
        ))
    }
}

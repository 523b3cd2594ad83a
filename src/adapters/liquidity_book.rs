use async_trait::async_trait;
use ethers::prelude::Address;
use log::debug;
use std::sync::Arc;

use crate::chain_reader::{ContractReader, ReadError};
use crate::contracts::{lb_pair, range_vault};
use crate::normalization::PositionValue;
use crate::range_adapter::RangeAdapter;

/// Active-bin adapter: the active id lives on the book (LB pair), the bin
/// range on the vault itself.
#[derive(Clone)]
pub struct LiquidityBookAdapter {
    book_address: Address,
    vault_address: Address,
    reader: Arc<dyn ContractReader>,
}

impl LiquidityBookAdapter {
    pub fn new(book_address: Address, vault_address: Address, reader: Arc<dyn ContractReader>) -> Self {
        Self { book_address, vault_address, reader }
    }
}

#[async_trait]
impl RangeAdapter for LiquidityBookAdapter {
    fn name(&self) -> &'static str {
        "LiquidityBook"
    }

    async fn read_active_position(&self) -> Result<i128, ReadError> {
        let data = self.reader.call(&lb_pair::get_active_id(self.book_address)).await?;
        let id = lb_pair::decode_active_id(&data)?;
        debug!("LB book {:?} active id {}", self.book_address, id);
        Ok(PositionValue::from(id).to_i128()?)
    }

    async fn read_bounds(&self) -> Result<(i128, i128), ReadError> {
        let data = self.reader.call(&range_vault::get_range(self.vault_address)).await?;
        let (lower, upper) = range_vault::decode_bin_range(&data)?;
        Ok((
            PositionValue::from(lower).to_i128()?,
            PositionValue::from(upper).to_i128()?,
        ))
    }
}

//! # Range Adapter Trait
//!
//! Each supported range protocol family exposes the same two reads: the pool's
//! current active position (bin id or tick) and the vault's deployed
//! `[lower, upper]` bounds. Both are normalized to `i128` so the
//! [`range_evaluator`](crate::range_evaluator) never sees protocol widths.
//!
//! ## Adding a New Protocol Family
//!
//! 1. Implement [`RangeAdapter`] under `src/adapters/`
//! 2. Add a [`RangeProtocol`](crate::types::RangeProtocol) variant
//! 3. Wire it into [`ProtocolAdapter::for_vault`](crate::protocol_adapter::ProtocolAdapter::for_vault)

use async_trait::async_trait;

use crate::chain_reader::ReadError;

/// The main trait for range protocol adapters.
///
/// The two reads are independent: callers may issue them concurrently and
/// apply whichever resolves first.
#[async_trait]
pub trait RangeAdapter: Send + Sync {
    /// Returns the name of the protocol family, used for logging.
    fn name(&self) -> &'static str;

    /// Current active bin id / tick of the underlying pool.
    async fn read_active_position(&self) -> Result<i128, ReadError>;

    /// Deployed `(lower, upper)` bounds of the vault position.
    async fn read_bounds(&self) -> Result<(i128, i128), ReadError>;
}

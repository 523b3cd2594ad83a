// Range Adapters Module
// One adapter per range protocol family, all behind the RangeAdapter trait

pub mod concentrated_liquidity;
pub mod liquidity_book;

pub use crate::range_adapter::RangeAdapter;
pub use concentrated_liquidity::ConcentratedLiquidityAdapter;
pub use liquidity_book::LiquidityBookAdapter;

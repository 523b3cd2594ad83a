//! Shared value types and conversions between ABI primitives and SDK types.

pub mod conversions;
pub mod vault;

pub use conversions::ConversionError;
pub use vault::{BalancePair, PricePoint, RangeProtocol, RangeState, TokenMeta, VaultIdentity};

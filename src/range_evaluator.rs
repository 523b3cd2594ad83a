// Range Evaluator - is the vault position bounding the active bin/tick?

use crate::types::RangeState;

/// Returns `None` while any input is still unloaded, otherwise whether
/// `lower <= active <= upper` (both bounds inclusive).
///
/// Bounds ordering is not validated; an inverted range simply evaluates to
/// `false`.
pub fn evaluate(state: &RangeState) -> Option<bool> {
    let active = state.active_position?;
    let lower = state.lower_bound?;
    let upper = state.upper_bound?;
    Some(lower <= active && active <= upper)
}

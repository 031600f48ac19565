use crate::config::{BASIS_POINTS, COIN_DECIMALS, COIN_VALUE};

/// Format any atomic amount to a human readable value with `COIN_DECIMALS` decimals
pub fn format_coin(value: u64) -> String {
    format!(
        "{}.{:0width$}",
        value / COIN_VALUE,
        value % COIN_VALUE,
        width = COIN_DECIMALS as usize
    )
}

/// Format a signed atomic amount (used for audit differences)
pub fn format_signed_coin(value: i128) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let coin = COIN_VALUE as u128;
    format!(
        "{}{}.{:0width$}",
        sign,
        abs / coin,
        abs % coin,
        width = COIN_DECIMALS as usize
    )
}

/// Apply a basis points ratio to an amount, rounding down.
/// Uses u128 internally so it never overflows.
pub fn apply_bps(amount: u64, bps: u16) -> u64 {
    ((amount as u128 * bps as u128) / BASIS_POINTS as u128) as u64
}

/// Same as `apply_bps` but keeps full precision for aggregated values
pub fn apply_bps_u128(amount: u128, bps: u16) -> u128 {
    amount * bps as u128 / BASIS_POINTS as u128
}

use rust_decimal::Decimal;
use std::str::FromStr;

/// Exact decimal quantity. Every resource amount, cost, magnitude, and rate
/// in the engine is an `Amount`; floating point never enters the sim loop.
pub type Amount = Decimal;

/// Ticks are the atomic unit of simulated time.
pub type Ticks = u64;

/// Wall-clock milliseconds, as reported by the host.
pub type Millis = u64;

/// Convert an integer to an Amount.
#[inline]
pub fn amount(v: i64) -> Amount {
    Decimal::from(v)
}

/// Parse a decimal string. Used for save files and content catalogs, where
/// amounts are always carried as strings to avoid precision loss.
pub fn parse_amount(s: &str) -> Option<Amount> {
    Decimal::from_str(s).ok()
}

/// Convert an f64 to an Amount. Use only for content initialization, never
/// in the sim loop; lossy f64 round-trips would break determinism.
pub fn amount_from_f64(v: f64) -> Option<Amount> {
    Decimal::from_f64_retain(v)
}

/// Multiply an amount by a whole number of ticks.
#[inline]
pub fn scale_by_ticks(a: Amount, ticks: Ticks) -> Amount {
    a * Decimal::from(ticks)
}

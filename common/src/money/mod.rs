//! Decimal type utilities for precise monetary calculations

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Monetary amount in currency units with 2 fractional digits
pub type Amount = Decimal;

/// Commission rate as a decimal percentage (0-100)
pub type Rate = Decimal;

/// Precision helpers for common operations
pub mod precision {
    use super::*;
    use rust_decimal::RoundingStrategy;

    /// Monetary precision (2 decimal places)
    pub const MONEY_PRECISION: u32 = 2;

    /// Commission rate precision (2 decimal places)
    pub const RATE_PRECISION: u32 = 2;

    /// Round a monetary amount to standard precision, half away from zero
    pub fn round_money(amount: Amount) -> Amount {
        amount.round_dp_with_strategy(MONEY_PRECISION, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Round a commission rate to standard precision
    pub fn round_rate(rate: Rate) -> Rate {
        rate.round_dp_with_strategy(RATE_PRECISION, RoundingStrategy::MidpointAwayFromZero)
    }
}

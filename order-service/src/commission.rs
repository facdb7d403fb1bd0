//! Commission split calculation
//!
//! Pure arithmetic with no store access, so callers can also use it to
//! preview a split before committing an assignment.

use common::error::{Error, Result};
use common::money::{precision, Amount, Rate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of splitting an order amount between the platform and the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    /// Platform's cut, rounded to monetary precision
    pub platform_commission: Amount,
    /// Agent's cut, the exact remainder
    pub agent_earnings: Amount,
}

/// Split an order amount between the platform and the assigned agent.
///
/// The platform cut is `amount * rate / 100` rounded to 2 decimal places;
/// the agent cut is the exact remainder, so the two always sum back to
/// `amount` with no rounding drift.
pub fn compute_split(amount: Amount, rate_percent: Rate) -> Result<CommissionSplit> {
    if rate_percent < Decimal::ZERO || rate_percent > Decimal::ONE_HUNDRED {
        return Err(Error::InvalidCommissionRate(format!(
            "Commission rate must be between 0 and 100, got {}",
            rate_percent
        )));
    }

    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(format!(
            "Order amount must be positive, got {}",
            amount
        )));
    }

    let platform_commission = precision::round_money(amount * rate_percent / Decimal::ONE_HUNDRED);
    let agent_earnings = amount - platform_commission;

    Ok(CommissionSplit {
        platform_commission,
        agent_earnings,
    })
}

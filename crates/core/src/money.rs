//! Fixed-point currency helpers.
//!
//! Every money value in the system is a [`Money`] (`rust_decimal::Decimal`)
//! normalized to two fractional digits. Floating-point input is only ever
//! accepted at the boundary, and even then it is parsed from its textual
//! form so no binary rounding error leaks into the ledger.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};

use crate::error::CoreError;
use crate::types::Money;

/// Number of fractional digits carried by every money value.
pub const MONEY_SCALE: u32 = 2;

/// Largest value a `NUMERIC(12,2)` money column holds.
pub const MAX_AMOUNT: Money = Decimal::from_parts(3_567_587_327, 232, 0, false, MONEY_SCALE);

/// Round to [`MONEY_SCALE`] digits, midpoint away from zero.
pub fn normalize(amount: Money) -> Money {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Parse a decimal string such as `"12.5"`, `"0.10"` or `"1e2"`.
pub fn parse_amount(raw: &str) -> Result<Money, CoreError> {
    let trimmed = raw.trim();
    let parsed = if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed)
    } else {
        Decimal::from_str(trimmed)
    };
    parsed
        .map(normalize)
        .map_err(|_| CoreError::Validation(format!("Invalid amount: {trimmed:?}")))
}

/// Convert a JSON number or string into money.
///
/// Numbers are converted through their shortest textual representation, so
/// `60.1` becomes exactly `60.10`.
pub fn amount_from_json(value: &serde_json::Value) -> Result<Money, CoreError> {
    match value {
        serde_json::Value::Number(n) => parse_amount(&n.to_string()),
        serde_json::Value::String(s) => parse_amount(s),
        other => Err(CoreError::Validation(format!(
            "Amount must be a number, got {other}"
        ))),
    }
}

/// Validate a spend amount: strictly positive after rounding and no larger
/// than [`MAX_AMOUNT`].
pub fn validate_spend_amount(amount: Money) -> Result<Money, CoreError> {
    let amount = normalize(amount);
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(
            "Amount must be greater than 0".to_string(),
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(CoreError::Validation(format!(
            "Amount must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(amount)
}

/// Validate a budget limit: strictly positive and within [`MAX_AMOUNT`].
pub fn validate_budget(field: &str, amount: Money) -> Result<Money, CoreError> {
    let amount = normalize(amount);
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(CoreError::Validation(format!(
            "{field} must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(amount)
}

/// `spent / budget * 100`, rounded to two digits. A zero budget reports 0.
pub fn utilization_percent(spent: Money, budget: Money) -> Decimal {
    if budget.is_zero() {
        return Decimal::ZERO;
    }
    normalize(spent * Decimal::ONE_HUNDRED / budget)
}

/// `serde(deserialize_with)` adapter accepting a JSON number or string.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    amount_from_json(&value).map_err(serde::de::Error::custom)
}

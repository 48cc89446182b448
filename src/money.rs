//! Cent-precision arithmetic shared by every engine.
//!
//! Every figure that ends up on a schedule line passes through [`combine`] or
//! [`round_money`], so values are always held at two decimal places and
//! repeated additions of already-rounded amounts cannot drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places carried by every monetary figure.
pub const MONEY_SCALE: u32 = 2;

/// Arithmetic operator accepted by [`combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Rounds to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Combines two monetary values and rounds the result to cents.
///
/// Division by zero and overflow both produce zero rather than an error; a
/// single degenerate figure zeroes the affected value instead of aborting the
/// whole schedule.
pub fn combine(a: Decimal, b: Decimal, op: MoneyOp) -> Decimal {
    let result = match op {
        MoneyOp::Add => a.checked_add(b),
        MoneyOp::Sub => a.checked_sub(b),
        MoneyOp::Mul => a.checked_mul(b),
        MoneyOp::Div if b.is_zero() => None,
        MoneyOp::Div => a.checked_div(b),
    };
    result.map(round_money).unwrap_or(Decimal::ZERO)
}

/// Sums a sequence of amounts with cent rounding after each addition.
pub fn sum<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, value| combine(acc, value, MoneyOp::Add))
}

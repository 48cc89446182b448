//! VAT decomposition of a cash flow into net and tax parts.

use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{MoneyOp, combine, round_money};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// A monetary value split into its net and tax parts.
///
/// A single leg from [`extract_tax`] or [`add_tax`] keeps `gross_value`
/// equal to `net_value + tax_value`. The monthly breakdown of a schedule line
/// does not: its net is the plain installment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyBreakdown {
    pub gross_value: Decimal,
    pub net_value: Decimal,
    pub tax_value: Decimal,
}

impl MoneyBreakdown {
    pub const ZERO: MoneyBreakdown = MoneyBreakdown {
        gross_value: Decimal::ZERO,
        net_value: Decimal::ZERO,
        tax_value: Decimal::ZERO,
    };

    /// Moves `amount` from the net part into the tax part, leaving gross untouched.
    pub fn shift_net_to_tax(&mut self, amount: Decimal) {
        self.net_value = combine(self.net_value, amount, MoneyOp::Sub);
        self.tax_value = combine(self.tax_value, amount, MoneyOp::Add);
    }
}

impl Add for MoneyBreakdown {
    type Output = MoneyBreakdown;

    fn add(self, other: MoneyBreakdown) -> MoneyBreakdown {
        MoneyBreakdown {
            gross_value: combine(self.gross_value, other.gross_value, MoneyOp::Add),
            net_value: combine(self.net_value, other.net_value, MoneyOp::Add),
            tax_value: combine(self.tax_value, other.tax_value, MoneyOp::Add),
        }
    }
}

/// Which way a leg of an installment is taxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxDirection {
    /// The value already includes tax; see [`extract_tax`].
    Extract,
    /// The value is net and tax is charged on top; see [`add_tax`].
    Add,
}

impl TaxDirection {
    pub fn split(self, value: Decimal, percent: Decimal) -> MoneyBreakdown {
        match self {
            TaxDirection::Extract => extract_tax(value, percent),
            TaxDirection::Add => add_tax(value, percent),
        }
    }
}

/// Splits a tax-inclusive `value` into net and tax under `percent`.
///
/// `tax = value * percent / (100 + percent)`, `net = value - tax`. A zero
/// percent leaves the whole value net. Arithmetic failure yields
/// [`MoneyBreakdown::ZERO`].
pub fn extract_tax(value: Decimal, percent: Decimal) -> MoneyBreakdown {
    if percent.is_zero() {
        return MoneyBreakdown {
            gross_value: value,
            net_value: value,
            tax_value: Decimal::ZERO,
        };
    }

    let tax = value
        .checked_mul(percent)
        .zip(HUNDRED.checked_add(percent).filter(|d| !d.is_zero()))
        .and_then(|(numerator, denominator)| numerator.checked_div(denominator));
    let Some(tax) = tax.map(round_money) else {
        return MoneyBreakdown::ZERO;
    };

    MoneyBreakdown {
        gross_value: value,
        net_value: combine(value, tax, MoneyOp::Sub),
        tax_value: tax,
    }
}

/// Charges `percent` tax on top of a net `value`.
///
/// `tax = value * percent / 100`, `gross = value + tax`. A zero percent
/// charges nothing. Arithmetic failure yields [`MoneyBreakdown::ZERO`].
pub fn add_tax(value: Decimal, percent: Decimal) -> MoneyBreakdown {
    if percent.is_zero() {
        return MoneyBreakdown {
            gross_value: value,
            net_value: value,
            tax_value: Decimal::ZERO,
        };
    }

    let Some(tax) = value
        .checked_mul(percent)
        .and_then(|d| d.checked_div(HUNDRED))
        .map(round_money)
    else {
        return MoneyBreakdown::ZERO;
    };

    MoneyBreakdown {
        gross_value: combine(value, tax, MoneyOp::Add),
        net_value: value,
        tax_value: tax,
    }
}

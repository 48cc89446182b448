//! Differentiated (straight-line) amortization: the principal part is an even
//! split of the outstanding balance, so the total installment declines.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{AmortizationEngine, EngineState, Installment};
use crate::money::{MoneyOp, combine, round_money};
use crate::request::{LeaseTerms, OverrideSet};
use crate::tax::TaxDirection;

/// Days of interest charged per month.
const DAYS_PER_MONTH: Decimal = dec!(30);
/// Percent-scaled day count of a year: 365 days times 100.
const PERCENT_DAYS_PER_YEAR: Decimal = dec!(36500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferentiatedState {
    pub balance: Decimal,
    /// Nominal annual percent.
    pub percent: Decimal,
    /// Principal charged in the coming month.
    pub principal_target: Decimal,
    pub term: u32,
}

impl EngineState for DifferentiatedState {
    fn term(&self) -> u32 {
        self.term
    }

    fn balance(&self) -> Decimal {
        self.balance
    }

    fn set_balance(&mut self, balance: Decimal) {
        self.balance = balance;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifferentiatedEngine {
    redemption_value: Decimal,
}

impl DifferentiatedEngine {
    pub fn new(redemption_value: Decimal) -> Self {
        Self { redemption_value }
    }

    /// Interest of a regular month, accrued on the balance plus the redemption value.
    fn interest_on(&self, state: &DifferentiatedState) -> Decimal {
        let base = combine(state.balance, self.redemption_value, MoneyOp::Add);
        monthly_interest(base, state.percent)
    }

    /// Percent, payment and term overrides are independent and all apply.
    ///
    /// A payment override sets the principal to the payment less the interest
    /// on the financed balance alone.
    fn reschedule(
        mut state: DifferentiatedState,
        month: u32,
        overrides: &OverrideSet,
    ) -> DifferentiatedState {
        if let Some(percent) = overrides.percent {
            state.percent = percent;
        }
        if let Some(payment) = overrides.payment {
            let interest = monthly_interest(state.balance, state.percent);
            state.principal_target = combine(payment, interest, MoneyOp::Sub);
        }
        if let Some(term) = overrides.term_from(month) {
            state.term = term;
        }
        state
    }
}

impl AmortizationEngine for DifferentiatedEngine {
    type State = DifferentiatedState;

    const INTEREST_TAX: TaxDirection = TaxDirection::Add;

    fn initialize(&self, terms: &LeaseTerms) -> DifferentiatedState {
        DifferentiatedState {
            balance: terms.financed_amount,
            percent: terms.annual_percent,
            principal_target: even_split(terms.financed_amount, terms.term),
            term: terms.term,
        }
    }

    fn step(
        &self,
        mut state: DifferentiatedState,
        month: u32,
        overrides: Option<&OverrideSet>,
    ) -> (DifferentiatedState, Installment) {
        if let Some(set) = overrides {
            state = Self::reschedule(state, month, set);
        }

        // The final month charges interest on the financed balance only.
        let interest = if month < state.term {
            self.interest_on(&state)
        } else {
            monthly_interest(state.balance, state.percent)
        };
        let principal = state.principal_target;
        state.balance = combine(state.balance, principal, MoneyOp::Sub);
        if month < state.term {
            state.principal_target = even_split(state.balance, state.term - month);
        }

        (state, Installment { interest, principal })
    }
}

/// Interest for one month on a 30/365 day count.
pub fn monthly_interest(balance: Decimal, annual_percent: Decimal) -> Decimal {
    balance
        .checked_mul(annual_percent)
        .and_then(|d| d.checked_mul(DAYS_PER_MONTH))
        .and_then(|d| d.checked_div(PERCENT_DAYS_PER_YEAR))
        .map(round_money)
        .unwrap_or(Decimal::ZERO)
}

fn even_split(balance: Decimal, periods: u32) -> Decimal {
    combine(balance, Decimal::from(periods), MoneyOp::Div)
}

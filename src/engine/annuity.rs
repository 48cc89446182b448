//! Annuity (French) amortization: a fixed total installment whose interest
//! part shrinks while the principal part grows.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use super::{AmortizationEngine, EngineState, Installment};
use crate::money::{MoneyOp, combine};
use crate::request::{LeaseTerms, OverrideSet};
use crate::tax::TaxDirection;

/// State carried from one annuity month to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnuityState {
    pub balance: Decimal,
    /// Monthly rate: `annual_percent / 12 / 100`.
    pub coefficient: Decimal,
    pub annuity_factor: Decimal,
    pub installment: Decimal,
    pub term: u32,
}

impl EngineState for AnnuityState {
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
pub struct AnnuityEngine {
    /// Buyout value; it accrues interest every month but is never amortized.
    redemption_value: Decimal,
}

impl AnnuityEngine {
    pub fn new(redemption_value: Decimal) -> Self {
        Self { redemption_value }
    }

    /// Interest of a regular month, accrued on the balance plus the redemption value.
    fn interest_on(&self, state: &AnnuityState) -> Decimal {
        let base = combine(state.balance, self.redemption_value, MoneyOp::Add);
        combine(base, state.coefficient, MoneyOp::Mul)
    }

    /// Charges a regular month's installment.
    fn charge_installment(&self, state: AnnuityState) -> (AnnuityState, Installment) {
        let interest = self.interest_on(&state);
        charge(state, interest)
    }

    /// Applies one month's overrides.
    ///
    /// Every combination of payment, percent and term has its own arm; the
    /// empty combination is a regular month.
    fn reschedule(
        &self,
        state: AnnuityState,
        month: u32,
        overrides: &OverrideSet,
    ) -> (AnnuityState, Installment) {
        match (overrides.payment, overrides.percent, overrides.term_from(month)) {
            (Some(payment), Some(percent), Some(term)) => {
                self.pay_reprice_extend(state, month, payment, percent, term)
            }
            (Some(payment), None, Some(term)) => self.pay_extend(state, month, payment, term),
            (None, Some(percent), Some(term)) => self.reprice_extend(state, month, percent, term),
            (Some(payment), Some(percent), None) => {
                self.pay_reprice(state, month, payment, percent)
            }
            (Some(payment), None, None) => self.pay(state, month, payment),
            (None, Some(percent), None) => self.reprice(state, month, percent),
            (None, None, Some(term)) => self.extend(state, month, term),
            (None, None, None) => self.charge_installment(state),
        }
    }

    fn pay_reprice_extend(
        &self,
        mut state: AnnuityState,
        month: u32,
        payment: Decimal,
        percent: Decimal,
        term: u32,
    ) -> (AnnuityState, Installment) {
        state.term = term;
        state.coefficient = monthly_coefficient(percent);
        let interest = balance_interest(&state);
        let (state, installment) = pay_down(state, payment, interest);
        (reamortize(state, periods_from(term, month)), installment)
    }

    fn pay_extend(
        &self,
        mut state: AnnuityState,
        month: u32,
        payment: Decimal,
        term: u32,
    ) -> (AnnuityState, Installment) {
        state.term = term;
        let (state, installment) = pay_down(state, payment, Decimal::ZERO);
        (reamortize(state, periods_after(term, month)), installment)
    }

    fn reprice_extend(
        &self,
        mut state: AnnuityState,
        month: u32,
        percent: Decimal,
        term: u32,
    ) -> (AnnuityState, Installment) {
        state.term = term;
        state.coefficient = monthly_coefficient(percent);
        recharge(reamortize(state, periods_from(term, month)))
    }

    fn pay_reprice(
        &self,
        mut state: AnnuityState,
        month: u32,
        payment: Decimal,
        percent: Decimal,
    ) -> (AnnuityState, Installment) {
        state.coefficient = monthly_coefficient(percent);
        let interest = balance_interest(&state);
        let term = state.term;
        let (state, installment) = pay_down(state, payment, interest);
        (reamortize(state, periods_after(term, month)), installment)
    }

    fn pay(
        &self,
        state: AnnuityState,
        month: u32,
        payment: Decimal,
    ) -> (AnnuityState, Installment) {
        let term = state.term;
        let (state, installment) = pay_down(state, payment, Decimal::ZERO);
        (reamortize(state, periods_after(term, month)), installment)
    }

    fn reprice(
        &self,
        mut state: AnnuityState,
        month: u32,
        percent: Decimal,
    ) -> (AnnuityState, Installment) {
        state.coefficient = monthly_coefficient(percent);
        let periods = periods_from(state.term, month);
        recharge(reamortize(state, periods))
    }

    fn extend(
        &self,
        mut state: AnnuityState,
        month: u32,
        term: u32,
    ) -> (AnnuityState, Installment) {
        state.term = term;
        recharge(reamortize(state, periods_from(term, month)))
    }
}

impl AmortizationEngine for AnnuityEngine {
    type State = AnnuityState;

    const INTEREST_TAX: TaxDirection = TaxDirection::Extract;

    fn initialize(&self, terms: &LeaseTerms) -> AnnuityState {
        let coefficient = monthly_coefficient(terms.annual_percent);
        let annuity_factor = annuity_factor(coefficient, i64::from(terms.term));
        AnnuityState {
            balance: terms.financed_amount,
            coefficient,
            annuity_factor,
            installment: combine(terms.financed_amount, annuity_factor, MoneyOp::Mul),
            term: terms.term,
        }
    }

    fn step(
        &self,
        state: AnnuityState,
        month: u32,
        overrides: Option<&OverrideSet>,
    ) -> (AnnuityState, Installment) {
        match overrides {
            Some(set) => self.reschedule(state, month, set),
            None => self.charge_installment(state),
        }
    }
}

/// Interest of a rescheduled month: the redemption value does not accrue.
fn balance_interest(state: &AnnuityState) -> Decimal {
    combine(state.balance, state.coefficient, MoneyOp::Mul)
}

/// Interest first, the rest of the installment is principal.
fn charge(mut state: AnnuityState, interest: Decimal) -> (AnnuityState, Installment) {
    let principal = combine(state.installment, interest, MoneyOp::Sub);
    state.balance = combine(state.balance, principal, MoneyOp::Sub);
    (state, Installment { interest, principal })
}

/// Charges a freshly reamortized installment after a rate or term change.
fn recharge(state: AnnuityState) -> (AnnuityState, Installment) {
    let interest = balance_interest(&state);
    charge(state, interest)
}

/// Treats `payment` as the whole cash paid this month: whatever exceeds
/// `interest` reduces the balance.
fn pay_down(
    mut state: AnnuityState,
    payment: Decimal,
    interest: Decimal,
) -> (AnnuityState, Installment) {
    let principal = combine(payment, interest, MoneyOp::Sub);
    state.balance = combine(state.balance, principal, MoneyOp::Sub);
    (state, Installment { interest, principal })
}

/// Recomputes the installment that repays the current balance over `periods`.
fn reamortize(mut state: AnnuityState, periods: i64) -> AnnuityState {
    state.annuity_factor = annuity_factor(state.coefficient, periods);
    state.installment = combine(state.balance, state.annuity_factor, MoneyOp::Mul);
    state
}

/// Installments left including the current month.
fn periods_from(term: u32, month: u32) -> i64 {
    i64::from(term) - i64::from(month) + 1
}

/// Installments left after the current month.
fn periods_after(term: u32, month: u32) -> i64 {
    i64::from(term) - i64::from(month)
}

/// Converts a nominal annual percentage into a monthly rate.
pub fn monthly_coefficient(annual_percent: Decimal) -> Decimal {
    annual_percent
        .checked_div(dec!(1200))
        .unwrap_or(Decimal::ZERO)
}

/// Share of the balance repaid by each installment: `k(1+k)^n / ((1+k)^n - 1)`.
///
/// With no periods left the whole balance is due (factor 1); a zero rate
/// degenerates to an even split.
pub fn annuity_factor(coefficient: Decimal, periods: i64) -> Decimal {
    if periods <= 0 {
        return Decimal::ONE;
    }
    let even_split = Decimal::ONE / Decimal::from(periods);
    if coefficient.is_zero() {
        return even_split;
    }

    // (1+k)^n overflowing means the factor has converged to k.
    let Some(growth) = (Decimal::ONE + coefficient).checked_powu(periods as u64) else {
        return coefficient;
    };
    let denominator = growth - Decimal::ONE;
    if denominator.is_zero() {
        return even_split;
    }
    coefficient
        .checked_mul(growth)
        .and_then(|numerator| numerator.checked_div(denominator))
        .unwrap_or(coefficient)
}

//! Amortization state machines.
//!
//! Both conventions are modelled as an explicit state value threaded through a
//! pure month step. [`run_months`] drives any [`AmortizationEngine`] from the
//! first installment to the last, firing rescheduling events on the way.

pub mod annuity;
pub mod differentiated;

use rust_decimal::Decimal;
use tracing::debug;

use crate::money::{MoneyOp, combine};
use crate::request::{LeaseTerms, OverrideSet};
use crate::tax::TaxDirection;

pub use annuity::{AnnuityEngine, AnnuityState};
pub use differentiated::{DifferentiatedEngine, DifferentiatedState};

/// Interest and principal charged for one month, both net of VAT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Installment {
    pub interest: Decimal,
    pub principal: Decimal,
}

/// The part of an engine state the month driver needs to see.
pub trait EngineState {
    /// Index of the final installment.
    fn term(&self) -> u32;
    /// Financed amount still outstanding, redemption value excluded.
    fn balance(&self) -> Decimal;
    fn set_balance(&mut self, balance: Decimal);
}

/// One amortization convention.
pub trait AmortizationEngine {
    type State: EngineState;

    /// How VAT is applied to the interest leg of an installment.
    const INTEREST_TAX: TaxDirection;

    fn initialize(&self, terms: &LeaseTerms) -> Self::State;

    /// Computes month `month`, applying `overrides` first when present, and
    /// returns the advanced state with the installment charged.
    fn step(
        &self,
        state: Self::State,
        month: u32,
        overrides: Option<&OverrideSet>,
    ) -> (Self::State, Installment);

    /// Settles the residual balance into the final installment.
    ///
    /// A negative balance (overpayment) moves out of principal and into
    /// interest; a positive one the other way round. The balance ends at zero.
    fn finalize_last_month(
        &self,
        mut state: Self::State,
        installment: Installment,
    ) -> (Self::State, Installment) {
        let residual = state.balance();
        state.set_balance(Decimal::ZERO);
        let settled = Installment {
            principal: combine(installment.principal, residual, MoneyOp::Add),
            interest: combine(installment.interest, residual, MoneyOp::Sub),
        };
        (state, settled)
    }
}

/// An installment together with the state it left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthResult {
    pub month: u32,
    pub installment: Installment,
    /// Outstanding financed balance after the payment.
    pub balance: Decimal,
    pub is_final: bool,
}

/// Runs `engine` month by month until its (possibly rescheduled) term ends.
pub fn run_months<E: AmortizationEngine>(engine: &E, terms: &LeaseTerms) -> Vec<MonthResult> {
    let mut state = engine.initialize(terms);
    let mut months = Vec::with_capacity(state.term() as usize);
    let mut month = 1;

    while month <= state.term() {
        let overrides = terms.events.get(&month);
        if let Some(set) = overrides {
            debug!(month, ?set, "applying reschedule event");
        }

        let (next, mut installment) = engine.step(state, month, overrides);
        state = next;

        let is_final = month >= state.term();
        if is_final {
            let (next, settled) = engine.finalize_last_month(state, installment);
            state = next;
            installment = settled;
        }

        months.push(MonthResult {
            month,
            installment,
            balance: state.balance(),
            is_final,
        });
        month += 1;
    }

    months
}

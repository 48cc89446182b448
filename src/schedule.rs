//! Assembly of the full schedule: the down payment line, the monthly lines,
//! the redemption line and the totals row, plus the rounding reconciliation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::dates::{PaymentDate, project_payment_date};
use crate::engine::{AmortizationEngine, MonthResult, run_months};
use crate::money::{MoneyOp, combine};
use crate::request::LeaseTerms;
use crate::tax::{MoneyBreakdown, extract_tax};

/// Marker written in the month column of the totals row.
pub const TOTALS_MARKER: &str = "total";

const CENT: Decimal = dec!(0.01);

/// The month column of a schedule line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMonth {
    Number(u32),
    Totals,
}

impl Serialize for ScheduleMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScheduleMonth::Number(month) => serializer.serialize_u32(*month),
            ScheduleMonth::Totals => serializer.serialize_str(TOTALS_MARKER),
        }
    }
}

/// One row of a leasing schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleLine {
    pub month: ScheduleMonth,
    pub payment_date: PaymentDate,
    /// Total cash due, VAT included.
    pub payment: Decimal,
    pub principal: Decimal,
    pub interest: Decimal,
    pub monthly_payment: MoneyBreakdown,
    pub interest_payment: MoneyBreakdown,
    pub principal_payment: MoneyBreakdown,
    /// Outstanding financed amount plus the redemption value.
    pub balance: Decimal,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_final_regular_installment: bool,
}

impl ScheduleLine {
    fn is_totals(&self) -> bool {
        self.month == ScheduleMonth::Totals
    }
}

/// Builds every line of the schedule for `engine`, totals row last.
pub fn assemble<E: AmortizationEngine>(engine: &E, terms: &LeaseTerms) -> Vec<ScheduleLine> {
    let months = run_months(engine, terms);

    let mut lines = Vec::with_capacity(months.len() + 3);
    lines.push(first_payment_line(terms));
    lines.extend(months.iter().map(|m| installment_line::<E>(terms, m)));
    lines.push(redemption_line(terms, lines.len() as u32));

    let unfired: Vec<u32> = terms
        .events
        .keys()
        .copied()
        .filter(|trigger| *trigger == 0 || *trigger > months.len() as u32)
        .collect();
    if !unfired.is_empty() {
        warn!(?unfired, "reschedule events outside the schedule were ignored");
    }

    reconcile(&mut lines, terms);
    lines.push(totals_line(&lines));
    lines
}

/// Month 0: the down payment, all of it principal.
pub fn first_payment_line(terms: &LeaseTerms) -> ScheduleLine {
    let principal_payment = extract_tax(terms.first_payment, terms.client_tax_rate);
    ScheduleLine {
        month: ScheduleMonth::Number(0),
        payment_date: project_payment_date(terms.start_date, 0),
        payment: terms.first_payment,
        principal: terms.first_payment,
        interest: Decimal::ZERO,
        monthly_payment: principal_payment,
        interest_payment: MoneyBreakdown::ZERO,
        principal_payment,
        balance: combine(terms.financed_amount, terms.redemption_value, MoneyOp::Add),
        is_final_regular_installment: false,
    }
}

/// One regular installment, split into its interest and principal legs.
///
/// The monthly breakdown carries the gross and tax totals of both legs, while
/// its net value is the installment itself (`interest + principal`).
pub fn installment_line<E: AmortizationEngine>(
    terms: &LeaseTerms,
    month: &MonthResult,
) -> ScheduleLine {
    let MonthResult {
        month: index,
        installment,
        balance,
        is_final,
    } = *month;

    let interest_payment = E::INTEREST_TAX.split(installment.interest, terms.lessor_tax_rate);
    let principal_payment = extract_tax(installment.principal, terms.client_tax_rate);
    let legs = interest_payment + principal_payment;
    let monthly_payment = MoneyBreakdown {
        net_value: combine(installment.interest, installment.principal, MoneyOp::Add),
        ..legs
    };

    ScheduleLine {
        month: ScheduleMonth::Number(index),
        payment_date: project_payment_date(terms.start_date, index),
        payment: monthly_payment.gross_value,
        principal: installment.principal,
        interest: installment.interest,
        monthly_payment,
        interest_payment,
        principal_payment,
        balance: combine(balance, terms.redemption_value, MoneyOp::Add),
        is_final_regular_installment: is_final,
    }
}

/// The buyout line settled after the last installment.
pub fn redemption_line(terms: &LeaseTerms, month: u32) -> ScheduleLine {
    let principal_payment = extract_tax(terms.redemption_value, terms.client_tax_rate);
    ScheduleLine {
        month: ScheduleMonth::Number(month),
        payment_date: project_payment_date(terms.start_date, month),
        payment: terms.redemption_value,
        principal: terms.redemption_value,
        interest: Decimal::ZERO,
        monthly_payment: principal_payment,
        interest_payment: MoneyBreakdown::ZERO,
        principal_payment,
        balance: Decimal::ZERO,
        is_final_regular_installment: false,
    }
}

/// Elementwise sum of every non-totals line.
pub fn totals_line(lines: &[ScheduleLine]) -> ScheduleLine {
    let empty = ScheduleLine {
        month: ScheduleMonth::Totals,
        payment_date: PaymentDate::Unscheduled,
        payment: Decimal::ZERO,
        principal: Decimal::ZERO,
        interest: Decimal::ZERO,
        monthly_payment: MoneyBreakdown::ZERO,
        interest_payment: MoneyBreakdown::ZERO,
        principal_payment: MoneyBreakdown::ZERO,
        balance: Decimal::ZERO,
        is_final_regular_installment: false,
    };

    lines
        .iter()
        .filter(|line| !line.is_totals())
        .fold(empty, |mut acc, line| {
            acc.payment = combine(acc.payment, line.payment, MoneyOp::Add);
            acc.principal = combine(acc.principal, line.principal, MoneyOp::Add);
            acc.interest = combine(acc.interest, line.interest, MoneyOp::Add);
            acc.monthly_payment = acc.monthly_payment + line.monthly_payment;
            acc.interest_payment = acc.interest_payment + line.interest_payment;
            acc.principal_payment = acc.principal_payment + line.principal_payment;
            acc.balance = combine(acc.balance, line.balance, MoneyOp::Add);
            acc
        })
}

/// Absorbs per-line rounding of the client VAT into the final installment.
///
/// After this the principal net values of all lines add up to exactly the net
/// part of `sum` under the client tax rate. Returns the amount moved.
pub fn reconcile(lines: &mut [ScheduleLine], terms: &LeaseTerms) -> Decimal {
    let expected_net = extract_tax(terms.sum, terms.client_tax_rate).net_value;
    let reported_net = totals_line(lines).principal_payment.net_value;
    let drift = combine(reported_net, expected_net, MoneyOp::Sub);
    // Each line rounds its VAT split once, so honest drift stays within a cent per line.
    let tolerance = combine(CENT, Decimal::from(lines.len()), MoneyOp::Mul);

    let Some(last) = lines.iter_mut().find(|line| line.is_final_regular_installment) else {
        return Decimal::ZERO;
    };
    if drift.is_zero() {
        return drift;
    }

    debug!(%drift, "reconciling client VAT rounding");
    if drift.abs() > tolerance {
        warn!(%drift, %tolerance, "client VAT drift exceeds per-line rounding");
    }

    last.principal_payment.shift_net_to_tax(drift);
    last.monthly_payment.shift_net_to_tax(drift);
    drift
}

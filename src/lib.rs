//! `leasing_schedule` computes payment schedules for leased or financed assets.
//!
//! Two amortization conventions are supported:
//! - **Annuity** (French method): a fixed total installment, with interest
//!   shrinking and principal growing over time.
//! - **Differentiated** (straight-line): the principal part is an even split of
//!   the outstanding balance, so the installment declines over time.
//!
//! Every line is split into interest (lessor side) and principal (client side)
//! legs, each with its own VAT breakdown. Rescheduling events can change the
//! payment, the rate or the remaining term at a given month, and the final
//! installment absorbs the VAT rounding so totals match the asset price.
//!
//! ## Usage
//!
//! ```rust
//! use leasing_schedule::{compute_schedule, ScheduleMonth, ScheduleRequest};
//! use rust_decimal_macros::dec;
//!
//! let request = ScheduleRequest {
//!     sum: dec!(1_200_000),
//!     first_payment: dec!(200_000),
//!     annual_percent: dec!(12),
//!     term_months: 12,
//!     first_payment_date: Some("01.03.2024".into()),
//!     redemption_percent: dec!(1),
//!     vat_rate: dec!(20),
//!     calculation_type: "annuity".into(),
//!     client_vat_applies: true,
//!     leasing_vat_applies: true,
//!     conditions: Vec::new(),
//! };
//!
//! let schedule = compute_schedule(&request).unwrap();
//! assert_eq!(schedule.len(), 15);
//!
//! for line in &schedule {
//!     if let ScheduleMonth::Number(month) = line.month {
//!         println!("{month:>3} {} {:.2} {:.2}", line.payment_date, line.payment, line.balance);
//!     }
//! }
//! ```

pub mod dates;
pub mod engine;
pub mod error;
pub mod money;
pub mod request;
pub mod schedule;
pub mod tax;
pub mod view;

use tracing::info;

use engine::{AnnuityEngine, DifferentiatedEngine};

pub use dates::PaymentDate;
pub use error::ScheduleError;
pub use request::{CalculationType, LeaseTerms, Override, RescheduleEvent, ScheduleRequest};
pub use schedule::{ScheduleLine, ScheduleMonth};
pub use tax::MoneyBreakdown;

/// Standard result type for schedule computations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Computes the full schedule for `request`.
///
/// The lines come in order: the down payment (month 0), one line per
/// installment (the last one flagged as the final regular installment), the
/// redemption line and finally the totals row.
///
/// # Errors
///
/// Returns an error if the calculation type is unknown or the first payment
/// date cannot be parsed.
pub fn compute_schedule(request: &ScheduleRequest) -> ScheduleResult<Vec<ScheduleLine>> {
    let terms = LeaseTerms::from_request(request)?;

    let lines = match terms.calculation_type {
        CalculationType::Annuity => {
            schedule::assemble(&AnnuityEngine::new(terms.redemption_value), &terms)
        }
        CalculationType::Differentiated => {
            schedule::assemble(&DifferentiatedEngine::new(terms.redemption_value), &terms)
        }
    };

    info!(
        calculation_type = %terms.calculation_type,
        financed_amount = %terms.financed_amount,
        lines = lines.len(),
        "schedule computed"
    );
    Ok(lines)
}

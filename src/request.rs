use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::parse_start_date;
use crate::error::ScheduleError;
use crate::money::{MoneyOp, combine, round_money};

/// Input parameters for a leasing schedule calculation.
///
/// Field names follow the JSON payload; aliases accept the legacy
/// short names (`percent`, `term`, `nds`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    /// Total price of the leased asset.
    pub sum: Decimal,
    /// Down payment made at signing (month 0).
    #[serde(default)]
    pub first_payment: Decimal,
    /// Nominal annual interest rate as a percentage (e.g. 12 for 12%).
    #[serde(alias = "percent")]
    pub annual_percent: Decimal,
    /// Number of monthly installments.
    #[serde(alias = "term")]
    pub term_months: u32,
    /// Date of the down payment, `dd.mm.yyyy` or `yyyy-mm-dd`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<String>,
    /// Buyout value as a percentage of `sum`, settled after the last installment.
    #[serde(default)]
    pub redemption_percent: Decimal,
    /// VAT rate as a percentage.
    #[serde(default, alias = "nds")]
    pub vat_rate: Decimal,
    /// `annuity` or `differentiated`.
    pub calculation_type: String,
    /// Split VAT out of the principal leg paid by the client.
    #[serde(default, alias = "clientNDSCalc")]
    pub client_vat_applies: bool,
    /// Split VAT out of the interest leg earned by the lessor.
    #[serde(default, alias = "leasingNDSCalc")]
    pub leasing_vat_applies: bool,
    #[serde(default)]
    pub conditions: Vec<RescheduleEvent>,
}

/// The amortization convention of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationType {
    /// Fixed total installment (French method).
    Annuity,
    /// Declining installment with an even principal split.
    Differentiated,
}

impl FromStr for CalculationType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "annuity" => Ok(CalculationType::Annuity),
            "differentiated" => Ok(CalculationType::Differentiated),
            other => Err(ScheduleError::UnsupportedCalculationType(other.to_string())),
        }
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationType::Annuity => f.write_str("annuity"),
            CalculationType::Differentiated => f.write_str("differentiated"),
        }
    }
}

/// A renegotiation of the lease effective at `trigger_month`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleEvent {
    /// 1-based month at which the overrides take effect.
    #[serde(alias = "term")]
    pub trigger_month: u32,
    #[serde(default, alias = "conditionData")]
    pub overrides: Vec<Override>,
}

/// One dimension of a [`RescheduleEvent`].
///
/// Serialized as `{"action": "payment", "data": {"sum": 50000}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "lowercase")]
pub enum Override {
    /// Total cash paid by the client in the trigger month.
    Payment { sum: Decimal },
    /// New nominal annual percent from the trigger month on.
    Percent { percent: Decimal },
    /// New index of the final installment.
    Term { end: u32 },
}

/// The overrides firing at one month, at most one per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideSet {
    pub payment: Option<Decimal>,
    pub percent: Option<Decimal>,
    pub term_end: Option<u32>,
}

impl OverrideSet {
    pub fn is_empty(&self) -> bool {
        self.payment.is_none() && self.percent.is_none() && self.term_end.is_none()
    }

    /// Folds `item` into the set; a later override of the same kind wins.
    pub fn apply(&mut self, item: &Override) {
        match *item {
            Override::Payment { sum } => self.payment = Some(sum),
            Override::Percent { percent } => self.percent = Some(percent),
            Override::Term { end } => self.term_end = Some(end),
        }
    }

    /// The requested final month, never earlier than `month` itself.
    pub fn term_from(&self, month: u32) -> Option<u32> {
        self.term_end.map(|end| end.max(month))
    }
}

/// Validated and derived form of a [`ScheduleRequest`], consumed by the engines.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaseTerms {
    pub calculation_type: CalculationType,
    pub sum: Decimal,
    pub first_payment: Decimal,
    pub redemption_value: Decimal,
    /// `sum - first_payment - redemption_value`: the amount actually amortized.
    pub financed_amount: Decimal,
    pub annual_percent: Decimal,
    pub term: u32,
    pub start_date: Option<NaiveDate>,
    /// VAT rate on the principal leg, zero when the client flag is off.
    pub client_tax_rate: Decimal,
    /// VAT rate on the interest leg, zero when the lessor flag is off.
    pub lessor_tax_rate: Decimal,
    /// Overrides keyed by trigger month.
    pub events: BTreeMap<u32, OverrideSet>,
}

impl LeaseTerms {
    pub fn from_request(request: &ScheduleRequest) -> Result<Self, ScheduleError> {
        let calculation_type = request.calculation_type.parse()?;
        let start_date = parse_start_date(request.first_payment_date.as_deref())?;

        let redemption_value = redemption_value(request.sum, request.redemption_percent);
        let financed_amount = combine(
            combine(request.sum, request.first_payment, MoneyOp::Sub),
            redemption_value,
            MoneyOp::Sub,
        );

        let mut events: BTreeMap<u32, OverrideSet> = BTreeMap::new();
        for event in &request.conditions {
            let set = events.entry(event.trigger_month).or_default();
            event.overrides.iter().for_each(|item| set.apply(item));
        }
        events.retain(|_, set| !set.is_empty());

        let gated = |applies: bool| if applies { request.vat_rate } else { Decimal::ZERO };

        Ok(LeaseTerms {
            calculation_type,
            sum: request.sum,
            first_payment: request.first_payment,
            redemption_value,
            financed_amount,
            annual_percent: request.annual_percent,
            term: request.term_months,
            start_date,
            client_tax_rate: gated(request.client_vat_applies),
            lessor_tax_rate: gated(request.leasing_vat_applies),
            events,
        })
    }
}

/// Buyout value: `sum * percent / 100`, in cents.
pub fn redemption_value(sum: Decimal, redemption_percent: Decimal) -> Decimal {
    sum.checked_mul(redemption_percent)
        .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED))
        .map(round_money)
        .unwrap_or(Decimal::ZERO)
}

//! Simplified client view of a schedule and the JSON response envelope.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::dates::PaymentDate;
use crate::schedule::{ScheduleLine, ScheduleMonth};

/// One schedule line as shown to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleView {
    pub month: ScheduleMonth,
    pub date: PaymentDate,
    /// Monthly payment including VAT.
    pub payment: Decimal,
    /// Principal net of VAT.
    pub principal: Decimal,
    /// Interest net of VAT.
    pub interest: Decimal,
    pub balance: Decimal,
}

impl From<&ScheduleLine> for ScheduleView {
    fn from(line: &ScheduleLine) -> Self {
        ScheduleView {
            month: line.month,
            date: line.payment_date,
            payment: line.monthly_payment.gross_value,
            principal: line.principal_payment.net_value,
            interest: line.interest_payment.net_value,
            balance: line.balance,
        }
    }
}

pub fn project(lines: &[ScheduleLine]) -> Vec<ScheduleView> {
    lines.iter().map(ScheduleView::from).collect()
}

/// `{"success": true, "data": [...]}` or `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ScheduleResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

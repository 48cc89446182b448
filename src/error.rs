use thiserror::Error;

/// Errors surfaced by [`compute_schedule`](crate::compute_schedule).
///
/// Numeric problems never show up here: the money and tax helpers substitute
/// zero instead of failing, so only structural input problems abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Unsupported calculation type: {0:?}")]
    UnsupportedCalculationType(String),

    #[error("Invalid first payment date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },
}

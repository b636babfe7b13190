//! Client-facing, recoverable domain errors.
//!
//! Every variant carries enough context for the caller to react (the
//! conflicting appointment, the rejected transition). Services surface
//! these through `anyhow::Result`; the REST layer downcasts to map them
//! to response codes. Nothing here is retried or swallowed internally.
use crate::domain::models::appointment::AppointmentStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookingError {
    /// Requested range overlaps an existing non-cancelled appointment, a
    /// break or time-off window, or the barber is not working then.
    #[error("Requested slot is unavailable: {reason}")]
    SlotUnavailable {
        reason: String,
        /// Id of the conflicting appointment, when one exists
        conflict: Option<String>,
    },

    #[error("Invalid status transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    /// Client already has an open booking, the period quota is exhausted,
    /// or a late-cancellation restriction is still in force.
    #[error("Subscription limit exceeded: {reason}")]
    SubscriptionLimitExceeded { reason: String },

    #[error("The original service line cannot be removed")]
    OriginalLineItemImmutable,

    /// End before start, or zero/negative duration.
    #[error("Invalid time range")]
    InvalidRange,

    #[error("Invalid distribution input: {detail}")]
    DistributionInputInvalid { detail: String },
}

impl BookingError {
    /// Stable machine-readable kind used in API error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::SlotUnavailable { .. } => "slot_unavailable",
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::SubscriptionLimitExceeded { .. } => "subscription_limit_exceeded",
            BookingError::OriginalLineItemImmutable => "original_line_item_immutable",
            BookingError::InvalidRange => "invalid_range",
            BookingError::DistributionInputInvalid { .. } => "distribution_input_invalid",
        }
    }
}

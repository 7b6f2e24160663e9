//! Mapping processor payloads to the canonical status enumeration, and the
//! timed-out-after-capturable classification.

use crate::domain::{PaymentEvent, ProcessorPayment, ProcessorStatus};
use crate::error::{Error, invalid_response};

/// Failure code the processor uses when the payment session expired before
/// the payment could be taken.
pub(crate) const SESSION_EXPIRED_CODE: &str = "P0020";

/// Maps one processor payload to its canonical status. Fails when the payload
/// carries no status or a status outside the known enumeration.
pub(crate) fn map_status(payment: &ProcessorPayment) -> Result<ProcessorStatus, Error> {
    let Some(name) = payment.state.status.as_deref().filter(|s| !s.is_empty()) else {
        return Err(invalid_response(&payment.payment_id, "payload carries no status"));
    };
    ProcessorStatus::from_name(name)
        .ok_or_else(|| invalid_response(&payment.payment_id, format!("unknown status: {name}")))
}

/// Whether a failed payment passed through the capturable state before
/// failing, i.e. the session genuinely timed out rather than the payment
/// failing up front.
///
/// Only a failed payment with the session-expiry failure code warrants the
/// event-history fetch; everything else short-circuits to `false` without a
/// remote call.
pub(crate) fn timed_out_after_capturable(
    payment: &ProcessorPayment,
    events: impl FnOnce() -> Result<Vec<PaymentEvent>, Error>,
) -> Result<bool, Error> {
    if map_status(payment)? != ProcessorStatus::Failed {
        return Ok(false);
    }
    if payment.state.code.as_deref() != Some(SESSION_EXPIRED_CODE) {
        return Ok(false);
    }
    let history = events()?;
    Ok(history
        .iter()
        .any(|event| event.was(ProcessorStatus::Capturable)))
}

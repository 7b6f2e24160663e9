//! The per-payment reconciliation decision.
//!
//! [`decide`] is a pure function from one ledger payment and its processor
//! snapshot to a [`Outcome`]: the ledger patch to apply, the gateway action
//! to take and the notification to send. Executing the outcome is the
//! driver's job.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    LedgerPayment, LedgerStatus, PaymentEvent, PaymentPatch, ProcessorPayment, ProcessorStatus,
    is_filled,
};
use crate::engine::attributes::attribute_patch;
use crate::engine::status::{map_status, timed_out_after_capturable};
use crate::error::Error;
use crate::notify::Template;

/// What to ask the processor to do with a capturable payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GatewayAction {
    None,
    Capture,
    Cancel,
}

/// A notification decided for this transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub template: Template,
    pub to: String,
}

/// Everything one reconciliation pass decided for one payment. Created and
/// consumed within a single sweep iteration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Outcome {
    pub status: Option<ProcessorStatus>,
    pub patch: PaymentPatch,
    pub action: GatewayAction,
    pub notice: Option<Notice>,
}

impl Outcome {
    fn unchanged(status: Option<ProcessorStatus>) -> Self {
        Self {
            status,
            patch: PaymentPatch::default(),
            action: GatewayAction::None,
            notice: None,
        }
    }
}

pub(crate) fn decide(
    payment: &LedgerPayment,
    processor: Option<&ProcessorPayment>,
    events: impl FnOnce() -> Result<Vec<PaymentEvent>, Error>,
    now: DateTime<Utc>,
) -> Result<Outcome, Error> {
    // Terminal ledger records are immutable.
    if payment.status.is_terminal() {
        return Ok(Outcome::unchanged(None));
    }

    // The processor does not know the payment at all.
    let Some(processor) = processor else {
        return Ok(Outcome {
            status: None,
            patch: status_patch(LedgerStatus::Failed),
            action: GatewayAction::None,
            notice: None,
        });
    };

    let status = map_status(processor)?;
    let outcome = match status {
        ProcessorStatus::Created | ProcessorStatus::Started | ProcessorStatus::Submitted => {
            Outcome::unchanged(Some(status))
        }

        ProcessorStatus::Capturable => decide_capturable(payment, processor, status),

        ProcessorStatus::Success => {
            // A success without a settlement date may still fail downstream;
            // leave the record pending and look again next cycle.
            let Some(received_at) = capture_time(processor, now) else {
                return Ok(Outcome::unchanged(Some(status)));
            };
            let mut patch = attribute_patch(Some(payment), Some(processor));
            patch.status = Some(LedgerStatus::Taken);
            patch.received_at = Some(received_at);
            let template = if reviewed_by_user(payment) {
                Template::Accepted
            } else {
                Template::Confirmation
            };
            Outcome {
                status: Some(status),
                patch,
                action: GatewayAction::None,
                notice: notice_for(payment, processor, template),
            }
        }

        ProcessorStatus::Failed => {
            if timed_out_after_capturable(processor, events)? {
                let template = if rejected_by_user(payment) {
                    Template::Rejected
                } else {
                    Template::Timeout
                };
                Outcome {
                    status: Some(status),
                    patch: status_patch(LedgerStatus::Expired),
                    action: GatewayAction::None,
                    notice: notice_for(payment, processor, template),
                }
            } else {
                // Failed before ever becoming capturable; nobody to tell.
                Outcome {
                    status: Some(status),
                    patch: status_patch(LedgerStatus::Failed),
                    action: GatewayAction::None,
                    notice: None,
                }
            }
        }

        ProcessorStatus::Cancelled => Outcome {
            status: Some(status),
            patch: status_patch(LedgerStatus::Rejected),
            action: GatewayAction::None,
            notice: notice_for(payment, processor, Template::Rejected),
        },

        ProcessorStatus::Error => Outcome {
            status: Some(status),
            patch: status_patch(LedgerStatus::Failed),
            action: GatewayAction::None,
            notice: None,
        },
    };
    Ok(outcome)
}

fn decide_capturable(
    payment: &LedgerPayment,
    processor: &ProcessorPayment,
    status: ProcessorStatus,
) -> Outcome {
    match payment.security_check {
        Some(check) if check.capture_approved() => Outcome {
            status: Some(status),
            patch: PaymentPatch::default(),
            action: GatewayAction::Capture,
            notice: None,
        },
        Some(check) if check.rejected_by_user() => Outcome {
            status: Some(status),
            patch: status_patch(LedgerStatus::Rejected),
            action: GatewayAction::Cancel,
            notice: notice_for(payment, processor, Template::Rejected),
        },
        // No verdict yet: fill in attributes and tell the sender once.
        // The ledger email doubles as the notice-sent marker.
        _ => {
            let notice = if !payment.has_email() && is_filled(processor.email.as_deref()) {
                processor.email.clone().map(|to| Notice {
                    template: Template::OnHold,
                    to,
                })
            } else {
                None
            };
            Outcome {
                status: Some(status),
                patch: attribute_patch(Some(payment), Some(processor)),
                action: GatewayAction::None,
                notice,
            }
        }
    }
}

fn status_patch(status: LedgerStatus) -> PaymentPatch {
    PaymentPatch {
        status: Some(status),
        ..Default::default()
    }
}

fn reviewed_by_user(payment: &LedgerPayment) -> bool {
    payment
        .security_check
        .is_some_and(|check| check.user_actioned)
}

fn rejected_by_user(payment: &LedgerPayment) -> bool {
    payment
        .security_check
        .is_some_and(|check| check.rejected_by_user())
}

fn notice_for(
    payment: &LedgerPayment,
    processor: &ProcessorPayment,
    template: Template,
) -> Option<Notice> {
    let to = [payment.email.as_deref(), processor.email.as_deref()]
        .into_iter()
        .flatten()
        .find(|address| !address.trim().is_empty())?;
    Some(Notice {
        template,
        to: to.to_string(),
    })
}

/// The instant the money was actually taken, derived from the settlement
/// summary: the capture submit time clamped into the captured date's day
/// (UTC). `None` when the captured date is absent, blank or unparseable.
pub(crate) fn capture_time(
    processor: &ProcessorPayment,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let summary = processor.settlement_summary.as_ref()?;
    let captured_date: NaiveDate = summary
        .captured_date
        .as_deref()
        .and_then(|text| text.trim().parse().ok())?;
    let submit_time = summary
        .capture_submit_time
        .as_deref()
        .and_then(|text| DateTime::parse_from_rfc3339(text.trim()).ok())
        .map(|time| time.with_timezone(&Utc))
        .unwrap_or(now);

    if submit_time.date_naive() < captured_date {
        captured_date.and_hms_opt(0, 0, 0).map(|t| t.and_utc())
    } else if submit_time.date_naive() > captured_date {
        captured_date
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .map(|t| t.and_utc())
    } else {
        Some(submit_time)
    }
}

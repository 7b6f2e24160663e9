//! The sweep over all incomplete ledger payments.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domain::{LedgerPayment, SecurityCheckStatus};
use crate::engine::reconcile::Reconciler;
use crate::error::Error;
use crate::gateway::ProcessorGateway;
use crate::ledger::LedgerStore;
use crate::notify::{NotificationSink, Notifier, NotifyLinks};

/// Answers "is this instance the one that should sweep this cycle?".
/// Deployments with redundant instances plug in their identity check here;
/// the decision is made once per cycle, before the loop starts.
pub trait InstanceOracle {
    fn is_primary(&self) -> Result<bool, Error>;
}

/// Oracle for single-instance deployments: always sweeps.
pub struct AlwaysPrimary;

impl InstanceOracle for AlwaysPrimary {
    fn is_primary(&self) -> Result<bool, Error> {
        Ok(true)
    }
}

/// Counters summarising one sweep invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// False when a secondary instance skipped the cycle
    pub performed: bool,
    pub checked: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub(crate) fn run_sweep(
    ledger: &dyn LedgerStore,
    gateway: &dyn ProcessorGateway,
    sink: &dyn NotificationSink,
    oracle: &dyn InstanceOracle,
    config: &Config,
) -> Result<SweepReport, Error> {
    match oracle.is_primary() {
        Ok(true) => {}
        Ok(false) => {
            info!("not sweeping: running on a secondary instance");
            return Ok(SweepReport::default());
        }
        Err(e) => warn!("cannot determine instance identity, sweeping anyway: {e}"),
    }

    // A listing failure is the one fatal condition of a sweep.
    let payments = ledger.incomplete_payments()?;

    let links = NotifyLinks {
        site_url: config.site_url.clone(),
        help_url: config.help_url.clone(),
        compliance_contact: config.compliance_contact.clone(),
    };
    let reconciler = Reconciler {
        ledger,
        gateway,
        notifier: Notifier::new(sink, &links),
    };

    let now = Utc::now();
    let mut report = SweepReport {
        performed: true,
        ..Default::default()
    };

    for payment in &payments {
        if !should_check(payment, config.check_age_threshold, now) {
            report.skipped += 1;
            continue;
        }
        if now - payment.modified > chrono::Duration::days(1) {
            warn!(
                payment = %payment.uuid,
                modified = %payment.modified,
                "payment is still pending a day after its last change"
            );
        }

        report.checked += 1;
        if let Err(e) = reconciler.reconcile_payment(payment) {
            report.failed += 1;
            log_payment_failure(payment, e);
        }
    }

    info!(
        checked = report.checked,
        skipped = report.skipped,
        failed = report.failed,
        "sweep complete"
    );
    Ok(report)
}

/// Whether this payment should be reconciled this cycle. A pending or
/// unactioned security check means the payment is awaiting manual review;
/// polling it would hammer the gateway for nothing, so such payments are only
/// re-examined once they pass the age threshold, in case the review itself
/// stalled.
fn should_check(
    payment: &LedgerPayment,
    age_threshold: chrono::Duration,
    now: DateTime<Utc>,
) -> bool {
    match payment.security_check {
        None => true,
        Some(check) => match check.status {
            SecurityCheckStatus::Accepted => true,
            SecurityCheckStatus::Rejected if check.user_actioned => true,
            SecurityCheckStatus::Pending | SecurityCheckStatus::Rejected => {
                now - payment.created >= age_threshold
            }
        },
    }
}

fn log_payment_failure(payment: &LedgerPayment, error: Error) {
    match error {
        Error::Auth { message } => {
            error!(payment = %payment.uuid, "authentication error during payment check: {message}");
        }
        Error::Transport { message, body } => {
            warn!(
                payment = %payment.uuid,
                body = body.as_deref().unwrap_or(""),
                "payment check failed: {message}"
            );
        }
        other => {
            warn!(payment = %payment.uuid, "payment check failed: {other}");
        }
    }
}

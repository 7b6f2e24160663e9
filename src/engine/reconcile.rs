//! The side-effecting driver executing reconciliation outcomes.
//!
//! Within one payment the order is fixed: fetch the processor snapshot,
//! execute the capture/cancel decision, re-check the settlement date, write
//! the ledger patch, then dispatch the notification.

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::domain::{LedgerPayment, ProcessorPayment, ProcessorStatus};
use crate::engine::logic::{GatewayAction, Outcome, decide};
use crate::error::Error;
use crate::gateway::ProcessorGateway;
use crate::ledger::LedgerStore;
use crate::notify::Notifier;

pub(crate) struct Reconciler<'a> {
    pub ledger: &'a dyn LedgerStore,
    pub gateway: &'a dyn ProcessorGateway,
    pub notifier: Notifier<'a>,
}

impl Reconciler<'_> {
    /// Reconciles a single payment. Any error returned here is a per-payment
    /// failure; the sweep logs it and moves on.
    pub(crate) fn reconcile_payment(&self, payment: &LedgerPayment) -> Result<(), Error> {
        if payment.status.is_terminal() {
            return Ok(());
        }

        let Some(id) = payment.processor_id.as_deref() else {
            // Never registered with the processor; same as a not-found.
            let outcome = decide(payment, None, || Ok(Vec::new()), Utc::now())?;
            return self.apply(payment, None, &outcome);
        };

        let processor = self.gateway.payment(id)?;
        let outcome = decide(
            payment,
            processor.as_ref(),
            || self.gateway.payment_events(id),
            Utc::now(),
        )?;

        match outcome.action {
            GatewayAction::None => self.apply(payment, processor.as_ref(), &outcome),
            GatewayAction::Capture => {
                self.finish(payment, "capture", || self.gateway.capture(id))?;
                // Re-fetch to see whether the settlement date is already
                // known; if not, the record stays pending until next cycle.
                let refreshed = self.gateway.payment(id)?;
                let followup = decide(
                    payment,
                    refreshed.as_ref(),
                    || self.gateway.payment_events(id),
                    Utc::now(),
                )?;
                if followup.action == GatewayAction::None {
                    self.apply(payment, refreshed.as_ref(), &followup)
                } else {
                    debug!(payment = %payment.uuid, "capture not yet visible at the processor");
                    Ok(())
                }
            }
            GatewayAction::Cancel => {
                self.finish(payment, "cancel", || self.gateway.cancel(id))?;
                self.apply(payment, processor.as_ref(), &outcome)
            }
        }
    }

    /// Runs a capture/cancel call, treating a conflict as already applied.
    fn finish(
        &self,
        payment: &LedgerPayment,
        verb: &str,
        call: impl FnOnce() -> Result<(), Error>,
    ) -> Result<(), Error> {
        match call() {
            Err(Error::Conflict { message }) => {
                debug!(payment = %payment.uuid, "{verb} already applied: {message}");
                Ok(())
            }
            other => other,
        }
    }

    fn apply(
        &self,
        payment: &LedgerPayment,
        processor: Option<&ProcessorPayment>,
        outcome: &Outcome,
    ) -> Result<(), Error> {
        if outcome.status == Some(ProcessorStatus::Error) {
            let state = processor.map(|p| &p.state);
            error!(
                payment = %payment.uuid,
                code = state.and_then(|s| s.code.as_deref()).unwrap_or("<none>"),
                message = state.and_then(|s| s.message.as_deref()).unwrap_or("<none>"),
                "processor reported an error state"
            );
        }

        if !outcome.patch.is_empty() {
            self.ledger.patch_payment(payment.uuid, &outcome.patch)?;
        }

        if let Some(notice) = &outcome.notice {
            // The transition is already recorded; a lost notice is logged,
            // not retried.
            if let Err(e) = self.notifier.send(notice.template, &notice.to, payment) {
                warn!(payment = %payment.uuid, "failed to send notification: {e}");
            }
        }
        Ok(())
    }
}

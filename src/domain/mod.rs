//! Module for the types defining the payment reconciliation domain.

mod ledger;
mod processor;

pub use ledger::{LedgerPayment, LedgerStatus, PaymentPatch, SecurityCheck, SecurityCheckStatus};
pub use processor::{
    CardDetails, PaymentEvent, PaymentState, ProcessorPayment, ProcessorStatus, SettlementSummary,
};

/// Returns true for field values that count as "set" for first-write-wins
/// purposes: present and not just whitespace.
pub(crate) fn is_filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

mod charges;
mod config;
mod domain;
mod engine;
mod error;
mod gateway;
mod ledger;
mod notify;
mod telemetry;

pub use charges::{ChargeRates, currency_format, currency_format_pence, parse_amount};
pub use config::Config;
pub use domain::{
    CardDetails, LedgerPayment, LedgerStatus, PaymentEvent, PaymentPatch, PaymentState,
    ProcessorPayment, ProcessorStatus, SecurityCheck, SecurityCheckStatus, SettlementSummary,
};
pub use engine::sweep::{AlwaysPrimary, InstanceOracle, SweepReport};
pub use error::Error;
pub use gateway::{HttpProcessorGateway, ProcessorGateway};
pub use ledger::{HttpLedgerStore, LedgerStore};
pub use notify::{HttpNotificationSink, Notification, NotificationSink, NotifyLinks, Template};
pub use telemetry::setup_logging;

/// Runs one reconciliation sweep over all incomplete ledger payments.
///
/// This is the single public entry point of the crate. It lists every payment
/// the ledger still holds in a non-terminal status, fetches the processor's
/// view of each, and applies the resulting status transition, attribute
/// fill-in, capture/cancel call and notification.
///
/// # Error handling
///
/// A failure while reconciling one payment never aborts the batch: it is
/// logged with the payment's reference and the sweep continues. The only
/// fatal condition is a failure to list the payment batch itself, which is
/// returned to the caller to be retried on the next scheduled cycle.
///
/// # Example
///
/// ```no_run
/// use payment_sweep_rs::{
///     AlwaysPrimary, Config, HttpLedgerStore, HttpNotificationSink, HttpProcessorGateway,
///     run_sweep,
/// };
///
/// let config = Config::from_env().unwrap();
/// let ledger = HttpLedgerStore::new(
///     config.ledger_url.clone(),
///     config.ledger_auth_token.clone(),
///     config.request_timeout,
/// )
/// .unwrap();
/// let gateway = HttpProcessorGateway::new(
///     config.processor_url.clone(),
///     config.processor_auth_token.clone(),
///     config.request_timeout,
/// )
/// .unwrap();
/// let sink = HttpNotificationSink::new(
///     config.notify_url.clone(),
///     config.notify_auth_token.clone(),
///     config.request_timeout,
/// )
/// .unwrap();
///
/// let report = run_sweep(&ledger, &gateway, &sink, &AlwaysPrimary, &config).unwrap();
/// println!("checked {} payments", report.checked);
/// ```
pub fn run_sweep(
    ledger: &dyn LedgerStore,
    gateway: &dyn ProcessorGateway,
    sink: &dyn NotificationSink,
    oracle: &dyn InstanceOracle,
    config: &Config,
) -> Result<SweepReport, Error> {
    engine::sweep::run_sweep(ledger, gateway, sink, oracle, config)
}

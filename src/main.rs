use anyhow::Result;
use std::env;

use payment_sweep_rs::{
    Config, Error, HttpLedgerStore, HttpNotificationSink, HttpProcessorGateway, InstanceOracle,
    run_sweep, setup_logging,
};

fn main() -> Result<()> {
    setup_logging()?;

    let quiet = env::args()
        .skip(1)
        .any(|arg| matches!(arg.as_str(), "-q" | "--quiet"));

    let config = Config::from_env()?;
    let ledger = HttpLedgerStore::new(
        config.ledger_url.clone(),
        config.ledger_auth_token.clone(),
        config.request_timeout,
    )?;
    let gateway = HttpProcessorGateway::new(
        config.processor_url.clone(),
        config.processor_auth_token.clone(),
        config.request_timeout,
    )?;
    let sink = HttpNotificationSink::new(
        config.notify_url.clone(),
        config.notify_auth_token.clone(),
        config.request_timeout,
    )?;

    // Per-payment failures are logged inside the sweep and do not affect the
    // exit code; only a batch-listing failure propagates.
    let report = run_sweep(&ledger, &gateway, &sink, &PlatformInstanceOracle, &config)?;

    if !quiet {
        if report.performed {
            println!(
                "Updated incomplete payments: {} checked, {} skipped, {} failed",
                report.checked, report.skipped, report.failed
            );
        } else {
            println!("Not updating incomplete payments because running on secondary instance");
        }
    }
    Ok(())
}

/// Primary-instance check based on the `INSTANCE_INDEX` variable set by the
/// deployment platform: instance 0 performs the sweep. When the variable is
/// missing the sweep falls back to running, which is correct for
/// single-instance deployments.
struct PlatformInstanceOracle;

impl InstanceOracle for PlatformInstanceOracle {
    fn is_primary(&self) -> Result<bool, Error> {
        match env::var("INSTANCE_INDEX") {
            Ok(index) => Ok(index.trim() == "0"),
            Err(_) => Err(Error::Transport {
                message: "INSTANCE_INDEX is not set".to_string(),
                body: None,
            }),
        }
    }
}

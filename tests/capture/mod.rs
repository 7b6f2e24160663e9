//! Scenarios around the capturable state: the security-check gate, capture
//! and cancel calls, and their idempotency.

use payment_sweep_rs::{Error, LedgerStatus, SecurityCheckStatus, run_sweep};

use crate::fakes::{
    FakeGateway, FakeLedger, FakeSink, FixedOracle, pending_payment, processor_payment,
    security_check, settled_processor_payment, test_config,
};

#[test]
fn approved_payment_is_captured_and_taken_when_settlement_is_visible() {
    let mut payment = pending_payment("pay-1");
    payment.security_check = security_check(SecurityCheckStatus::Accepted, true);
    let ledger = FakeLedger::with_payments(vec![payment]);
    let gateway = FakeGateway::with_payment(processor_payment("pay-1", "capturable"));
    gateway
        .post_capture
        .borrow_mut()
        .insert("pay-1".to_string(), settled_processor_payment("pay-1"));
    let sink = FakeSink::default();

    run_sweep(&ledger, &gateway, &sink, &FixedOracle(true), &test_config()).unwrap();

    let counts = gateway.counts();
    assert_eq!(counts.capture, 1);
    assert_eq!(counts.payment, 2, "initial fetch plus captured-date re-check");

    let patches = ledger.patches.borrow();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].1.status, Some(LedgerStatus::Taken));

    let sent = sink.sent.borrow();
    assert_eq!(sent.len(), 1);
    // the transition followed a user-actioned review
    assert_eq!(sent[0].template_id, "debit-card-payment-accepted");
}

#[test]
fn approved_payment_stays_pending_while_settlement_is_invisible() {
    let mut payment = pending_payment("pay-1");
    payment.security_check = security_check(SecurityCheckStatus::Accepted, true);
    let ledger = FakeLedger::with_payments(vec![payment]);
    // re-fetch after capture still reports capturable without a settlement date
    let gateway = FakeGateway::with_payment(processor_payment("pay-1", "capturable"));
    let sink = FakeSink::default();

    let report = run_sweep(&ledger, &gateway, &sink, &FixedOracle(true), &test_config()).unwrap();

    assert_eq!(report.failed, 0);
    assert_eq!(gateway.counts().capture, 1);
    assert!(ledger.patches.borrow().is_empty());
    assert!(sink.sent.borrow().is_empty());
}

#[test]
fn capture_conflict_is_treated_as_already_resolved() {
    let mut payment = pending_payment("pay-1");
    payment.security_check = security_check(SecurityCheckStatus::Accepted, true);
    let ledger = FakeLedger::with_payments(vec![payment]);

    // someone captured first: the capture call conflicts but the refreshed
    // snapshot already carries the settlement date
    let gateway = FakeGateway::with_payment(processor_payment("pay-1", "capturable"));
    gateway.capture_error.borrow_mut().replace(Error::Conflict {
        message: "capture already applied".to_string(),
    });
    gateway
        .payments
        .borrow_mut()
        .insert("pay-1".to_string(), settled_processor_payment("pay-1"));
    let sink = FakeSink::default();

    let report = run_sweep(&ledger, &gateway, &sink, &FixedOracle(true), &test_config()).unwrap();

    assert_eq!(report.failed, 0);
    let patches = ledger.patches.borrow();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].1.status, Some(LedgerStatus::Taken));
    assert_eq!(sink.sent.borrow().len(), 1);
}

#[test]
fn reconciling_a_taken_payment_again_sends_nothing() {
    // second cycle after a successful capture: the record is terminal
    let mut payment = pending_payment("pay-1");
    payment.status = LedgerStatus::Taken;
    payment.security_check = security_check(SecurityCheckStatus::Accepted, true);
    let ledger = FakeLedger::with_payments(vec![payment]);
    let gateway = FakeGateway::with_payment(settled_processor_payment("pay-1"));
    let sink = FakeSink::default();

    run_sweep(&ledger, &gateway, &sink, &FixedOracle(true), &test_config()).unwrap();

    assert_eq!(gateway.counts().capture, 0);
    assert!(ledger.patches.borrow().is_empty());
    assert!(sink.sent.borrow().is_empty());
}

#[test]
fn user_rejected_payment_is_cancelled_with_a_rejection_notice() {
    let mut payment = pending_payment("pay-1");
    payment.security_check = security_check(SecurityCheckStatus::Rejected, true);
    let ledger = FakeLedger::with_payments(vec![payment]);
    let gateway = FakeGateway::with_payment(processor_payment("pay-1", "capturable"));
    let sink = FakeSink::default();

    run_sweep(&ledger, &gateway, &sink, &FixedOracle(true), &test_config()).unwrap();

    assert_eq!(gateway.counts().cancel, 1);
    let patches = ledger.patches.borrow();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].1.status, Some(LedgerStatus::Rejected));

    let sent = sink.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template_id, "debit-card-payment-rejected");
    assert_eq!(
        sent[0].personalisation["compliance_contact"],
        "compliance@mtp.local"
    );
}

#[test]
fn unreviewed_payment_gets_one_on_hold_notice() {
    let payment = pending_payment("pay-1");
    let mut capturable = processor_payment("pay-1", "capturable");
    capturable.provider_id = Some("wp-123".to_string());

    // first cycle: no verdict yet, email unknown on the ledger
    {
        let mut first = payment.clone();
        first.security_check = security_check(SecurityCheckStatus::Pending, false);
        first.created = chrono::Utc::now() - chrono::Duration::hours(12); // past the age threshold
        let ledger = FakeLedger::with_payments(vec![first]);
        let gateway = FakeGateway::with_payment(capturable.clone());
        let sink = FakeSink::default();

        run_sweep(&ledger, &gateway, &sink, &FixedOracle(true), &test_config()).unwrap();

        let patches = ledger.patches.borrow();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].1.email.as_deref(), Some("sender@outside.local"));
        assert_eq!(patches[0].1.worldpay_id.as_deref(), Some("wp-123"));
        assert_eq!(patches[0].1.status, None);

        let sent = sink.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].template_id, "debit-card-payment-on-hold");
    }

    // next cycle: email recorded, so no further notice and no re-patch
    {
        let mut second = payment.clone();
        second.security_check = security_check(SecurityCheckStatus::Pending, false);
        second.created = chrono::Utc::now() - chrono::Duration::hours(12);
        second.email = Some("sender@outside.local".to_string());
        second.worldpay_id = Some("wp-123".to_string());
        let ledger = FakeLedger::with_payments(vec![second]);
        let gateway = FakeGateway::with_payment(capturable.clone());
        let sink = FakeSink::default();

        run_sweep(&ledger, &gateway, &sink, &FixedOracle(true), &test_config()).unwrap();

        assert!(ledger.patches.borrow().is_empty());
        assert!(sink.sent.borrow().is_empty());
    }
}

//! In-memory collaborators with call recording, shared by the integration
//! tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use rust_decimal_macros::dec;
use uuid::Uuid;

use payment_sweep_rs::{
    ChargeRates, Config, Error, InstanceOracle, LedgerPayment, LedgerStatus, LedgerStore,
    Notification, NotificationSink, PaymentEvent, PaymentPatch, PaymentState, ProcessorGateway,
    ProcessorPayment, SecurityCheck, SecurityCheckStatus, SettlementSummary,
};

pub fn test_config() -> Config {
    Config {
        ledger_url: "http://ledger.local".to_string(),
        ledger_auth_token: String::new(),
        processor_url: "http://pay.local/v1".to_string(),
        processor_auth_token: String::new(),
        notify_url: "http://notify.local".to_string(),
        notify_auth_token: String::new(),
        site_url: "https://send.money.local".to_string(),
        help_url: "https://send.money.local/help/".to_string(),
        compliance_contact: Some("compliance@mtp.local".to_string()),
        charge_rates: ChargeRates::new(dec!(2.4), dec!(20)),
        request_timeout: Duration::from_secs(15),
        check_age_threshold: chrono::Duration::hours(8),
    }
}

pub const PAYMENT_UUID: &str = "7f4efc7a-b9e5-4c27-9339-9b676cb2b52c";

pub fn pending_payment(processor_id: &str) -> LedgerPayment {
    LedgerPayment {
        uuid: PAYMENT_UUID.parse().unwrap(),
        processor_id: Some(processor_id.to_string()),
        recipient_name: "James Halls".to_string(),
        prisoner_number: Some("A1409AE".to_string()),
        amount: 1700,
        status: LedgerStatus::Pending,
        created: Utc::now() - chrono::Duration::hours(2),
        modified: Utc::now() - chrono::Duration::hours(2),
        security_check: None,
        email: None,
        worldpay_id: None,
        cardholder_name: None,
        card_brand: None,
        card_number_first_digits: None,
        card_number_last_digits: None,
        card_expiry_date: None,
        billing_address: None,
    }
}

pub fn security_check(status: SecurityCheckStatus, user_actioned: bool) -> Option<SecurityCheck> {
    Some(SecurityCheck {
        status,
        user_actioned,
    })
}

pub fn processor_payment(payment_id: &str, status: &str) -> ProcessorPayment {
    ProcessorPayment {
        payment_id: payment_id.to_string(),
        state: PaymentState {
            status: Some(status.to_string()),
            code: None,
            message: None,
        },
        email: Some("sender@outside.local".to_string()),
        settlement_summary: None,
        card_details: None,
        provider_id: None,
    }
}

pub fn settled_processor_payment(payment_id: &str) -> ProcessorPayment {
    let mut payment = processor_payment(payment_id, "success");
    payment.settlement_summary = Some(SettlementSummary {
        capture_submit_time: Some("2016-10-27T15:11:05Z".to_string()),
        captured_date: Some("2016-10-27".to_string()),
    });
    payment
}

pub fn event(status: &str) -> PaymentEvent {
    PaymentEvent {
        state: PaymentState {
            status: Some(status.to_string()),
            code: None,
            message: None,
        },
    }
}

#[derive(Default)]
pub struct FakeLedger {
    pub payments: Vec<LedgerPayment>,
    pub patches: RefCell<Vec<(Uuid, PaymentPatch)>>,
    pub fail_listing: bool,
}

impl FakeLedger {
    pub fn with_payments(payments: Vec<LedgerPayment>) -> Self {
        Self {
            payments,
            ..Default::default()
        }
    }
}

impl LedgerStore for FakeLedger {
    fn incomplete_payments(&self) -> Result<Vec<LedgerPayment>, Error> {
        if self.fail_listing {
            return Err(Error::Transport {
                message: "ledger unavailable".to_string(),
                body: None,
            });
        }
        Ok(self.payments.clone())
    }

    fn patch_payment(&self, reference: Uuid, patch: &PaymentPatch) -> Result<(), Error> {
        assert!(!patch.is_empty(), "engine must not send empty patches");
        self.patches.borrow_mut().push((reference, patch.clone()));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub payment: usize,
    pub events: usize,
    pub capture: usize,
    pub cancel: usize,
}

#[derive(Default)]
pub struct FakeGateway {
    pub payments: RefCell<HashMap<String, ProcessorPayment>>,
    pub events: HashMap<String, Vec<PaymentEvent>>,
    /// Snapshot the payment switches to once `capture` succeeds
    pub post_capture: RefCell<HashMap<String, ProcessorPayment>>,
    /// Error returned by the next `payment` fetch for the given id
    pub payment_errors: RefCell<HashMap<String, Error>>,
    /// Error returned by the next `capture` call
    pub capture_error: RefCell<Option<Error>>,
    pub counts: RefCell<CallCounts>,
}

impl FakeGateway {
    pub fn with_payment(payment: ProcessorPayment) -> Self {
        let gateway = Self::default();
        gateway
            .payments
            .borrow_mut()
            .insert(payment.payment_id.clone(), payment);
        gateway
    }

    pub fn counts(&self) -> CallCounts {
        *self.counts.borrow()
    }
}

impl ProcessorGateway for FakeGateway {
    fn payment(&self, payment_id: &str) -> Result<Option<ProcessorPayment>, Error> {
        self.counts.borrow_mut().payment += 1;
        if let Some(error) = self.payment_errors.borrow_mut().remove(payment_id) {
            return Err(error);
        }
        Ok(self.payments.borrow().get(payment_id).cloned())
    }

    fn payment_events(&self, payment_id: &str) -> Result<Vec<PaymentEvent>, Error> {
        self.counts.borrow_mut().events += 1;
        Ok(self.events.get(payment_id).cloned().unwrap_or_default())
    }

    fn capture(&self, payment_id: &str) -> Result<(), Error> {
        self.counts.borrow_mut().capture += 1;
        if let Some(error) = self.capture_error.borrow_mut().take() {
            return Err(error);
        }
        if let Some(after) = self.post_capture.borrow_mut().remove(payment_id) {
            self.payments
                .borrow_mut()
                .insert(payment_id.to_string(), after);
        }
        Ok(())
    }

    fn cancel(&self, payment_id: &str) -> Result<(), Error> {
        self.counts.borrow_mut().cancel += 1;
        if let Some(payment) = self.payments.borrow_mut().get_mut(payment_id) {
            payment.state.status = Some("cancelled".to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSink {
    pub sent: RefCell<Vec<Notification>>,
}

impl NotificationSink for FakeSink {
    fn dispatch(&self, notification: Notification) -> Result<(), Error> {
        self.sent.borrow_mut().push(notification);
        Ok(())
    }
}

pub struct FixedOracle(pub bool);

impl InstanceOracle for FixedOracle {
    fn is_primary(&self) -> Result<bool, Error> {
        Ok(self.0)
    }
}

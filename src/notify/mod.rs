//! Notification templates and dispatch.
//!
//! Each completed transition maps to exactly one template; the dispatcher
//! builds the personalisation map and hands the notification to a
//! [`NotificationSink`] exactly once per transition.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::charges::currency_format;
use crate::domain::LedgerPayment;
use crate::error::{Error, auth_error};
use crate::gateway::{is_auth_failure, unexpected_status};


/// The notification templates the service expects to exist at the
/// notification provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Payment taken without a user-actioned compliance review
    Confirmation,
    /// Payment awaiting compliance review; sent at most once
    OnHold,
    /// Payment taken after a user-actioned compliance review
    Accepted,
    /// Payment refused by compliance, or cancelled at the processor
    Rejected,
    /// Payment session expired before the payment could be taken
    Timeout,
}

impl Template {
    pub fn id(self) -> &'static str {
        match self {
            Template::Confirmation => "debit-card-confirmation",
            Template::OnHold => "debit-card-payment-on-hold",
            Template::Accepted => "debit-card-payment-accepted",
            Template::Rejected => "debit-card-payment-rejected",
            Template::Timeout => "debit-card-payment-timeout",
        }
    }

    /// Prefix of the per-payment dispatch reference, e.g. `confirmation-<uuid>`.
    fn reference_prefix(self) -> &'static str {
        match self {
            Template::Confirmation => "confirmation",
            Template::OnHold => "on-hold",
            Template::Accepted => "accepted",
            Template::Rejected => "rejected",
            Template::Timeout => "timeout",
        }
    }
}

/// A fully personalised notification, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub template_id: &'static str,
    pub to: String,
    pub reference: String,
    pub personalisation: BTreeMap<&'static str, String>,
}

/// Fire-and-forget delivery of one notification.
pub trait NotificationSink {
    fn dispatch(&self, notification: Notification) -> Result<(), Error>;
}

/// Links and contacts substituted into template bodies.
#[derive(Debug, Clone)]
pub struct NotifyLinks {
    pub site_url: String,
    pub help_url: String,
    /// Falls back to the help link when no dedicated contact is configured
    pub compliance_contact: Option<String>,
}

/// Builds notifications for a payment and hands them to the sink.
pub struct Notifier<'a> {
    sink: &'a dyn NotificationSink,
    links: &'a NotifyLinks,
}

impl<'a> Notifier<'a> {
    pub fn new(sink: &'a dyn NotificationSink, links: &'a NotifyLinks) -> Self {
        Self { sink, links }
    }

    pub fn send(
        &self,
        template: Template,
        to: &str,
        payment: &LedgerPayment,
    ) -> Result<(), Error> {
        let notification = self.build(template, to, payment);
        self.sink.dispatch(notification)
    }

    fn build(&self, template: Template, to: &str, payment: &LedgerPayment) -> Notification {
        let mut personalisation = BTreeMap::from([
            ("short_payment_ref", payment.short_ref()),
            ("prisoner_name", payment.recipient_name.clone()),
            (
                "amount",
                currency_format(Decimal::from(payment.amount) / Decimal::ONE_HUNDRED),
            ),
        ]);
        match template {
            Template::Confirmation => {
                personalisation.insert("today", Utc::now().format("%d/%m/%Y").to_string());
                personalisation.insert("site_url", self.links.site_url.clone());
                personalisation.insert("help_url", self.links.help_url.clone());
            }
            Template::Timeout => {
                personalisation.insert("site_url", self.links.site_url.clone());
                personalisation.insert("help_url", self.links.help_url.clone());
            }
            Template::Rejected => {
                let contact = self
                    .links
                    .compliance_contact
                    .clone()
                    .unwrap_or_else(|| self.links.help_url.clone());
                personalisation.insert("compliance_contact", contact);
            }
            Template::OnHold | Template::Accepted => {}
        }

        Notification {
            template_id: template.id(),
            to: to.to_string(),
            reference: format!("{}-{}", template.reference_prefix(), payment.uuid),
            personalisation,
        }
    }
}

/// Blocking HTTP sink posting notifications to the notification service.
pub struct HttpNotificationSink {
    base_url: String,
    auth_token: String,
    client: Client,
}

impl HttpNotificationSink {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            client,
        })
    }
}

impl NotificationSink for HttpNotificationSink {
    fn dispatch(&self, notification: Notification) -> Result<(), Error> {
        let url = format!(
            "{}/notifications/email",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.auth_token)
            .json(&notification)
            .send()?;

        let status = response.status();
        if is_auth_failure(status) {
            return Err(auth_error(format!("notification service returned {status}")));
        }
        if !status.is_success() {
            return Err(unexpected_status("notification service", response));
        }
        Ok(())
    }
}

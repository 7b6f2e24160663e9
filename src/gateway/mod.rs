//! The payment-processor collaborator: the trait the engine reconciles
//! against and its HTTP implementation.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;

use crate::domain::{PaymentEvent, ProcessorPayment, is_filled};
use crate::error::{Error, auth_error, conflict_error, transport_error};


/// Remote operations the engine needs from the processor. Implementations
/// must treat `capture`/`cancel` as idempotent from the caller's point of
/// view: a conflict response means the payment is already finished.
pub trait ProcessorGateway {
    /// Fetch the payment for one correlation id; `None` when the processor
    /// does not know the payment (HTTP 404).
    fn payment(&self, payment_id: &str) -> Result<Option<ProcessorPayment>, Error>;

    /// Fetch the ordered event history of one payment.
    fn payment_events(&self, payment_id: &str) -> Result<Vec<PaymentEvent>, Error>;

    /// Ask the processor to capture a capturable payment.
    fn capture(&self, payment_id: &str) -> Result<(), Error>;

    /// Ask the processor to cancel a capturable payment.
    fn cancel(&self, payment_id: &str) -> Result<(), Error>;
}

/// Blocking HTTP client for the processor API.
pub struct HttpProcessorGateway {
    base_url: String,
    auth_token: String,
    client: Client,
}

impl HttpProcessorGateway {
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

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str) -> Result<Response, Error> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.auth_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;
        Ok(response)
    }

    fn post(&self, path: &str) -> Result<Response, Error> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.auth_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;
        Ok(response)
    }
}

impl ProcessorGateway for HttpProcessorGateway {
    fn payment(&self, payment_id: &str) -> Result<Option<ProcessorPayment>, Error> {
        let response = self.get(&format!("/payments/{payment_id}"))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if is_auth_failure(status) => {
                Err(auth_error(format!("processor returned {status}")))
            }
            status if !status.is_success() => Err(unexpected_status("processor", response)),
            _ => {
                let mut payment: ProcessorPayment = response
                    .json()
                    .map_err(|e| transport_error(format!("cannot parse processor response: {e}"), None))?;
                scrub_email(&mut payment);
                Ok(Some(payment))
            }
        }
    }

    fn payment_events(&self, payment_id: &str) -> Result<Vec<PaymentEvent>, Error> {
        #[derive(Deserialize)]
        struct EventsPage {
            #[serde(default)]
            events: Vec<PaymentEvent>,
        }

        let response = self.get(&format!("/payments/{payment_id}/events"))?;
        match response.status() {
            status if is_auth_failure(status) => {
                Err(auth_error(format!("processor returned {status}")))
            }
            status if !status.is_success() => Err(unexpected_status("processor", response)),
            _ => {
                let page: EventsPage = response
                    .json()
                    .map_err(|e| transport_error(format!("cannot parse event history: {e}"), None))?;
                Ok(page.events)
            }
        }
    }

    fn capture(&self, payment_id: &str) -> Result<(), Error> {
        self.finishing_call(&format!("/payments/{payment_id}/capture/"), "capture")
    }

    fn cancel(&self, payment_id: &str) -> Result<(), Error> {
        self.finishing_call(&format!("/payments/{payment_id}/cancel/"), "cancel")
    }
}

impl HttpProcessorGateway {
    fn finishing_call(&self, path: &str, verb: &str) -> Result<(), Error> {
        let response = self.post(path)?;
        match response.status() {
            StatusCode::CONFLICT => Err(conflict_error(format!("{verb} already applied"))),
            status if is_auth_failure(status) => {
                Err(auth_error(format!("processor returned {status}")))
            }
            status if !status.is_success() => Err(unexpected_status("processor", response)),
            _ => Ok(()),
        }
    }
}

/// Drops an unusable email address from the payload rather than propagating it.
fn scrub_email(payment: &mut ProcessorPayment) {
    if !payment.email.as_deref().is_some_and(plausible_email) {
        payment.email = None;
    }
}

fn plausible_email(address: &str) -> bool {
    if !is_filled(Some(address)) {
        return false;
    }
    match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.starts_with('.')
        }
        None => false,
    }
}

pub(crate) fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

pub(crate) fn unexpected_status(collaborator: &str, response: Response) -> Error {
    let status = response.status();
    let body = response.text().ok().filter(|body| !body.is_empty());
    transport_error(format!("{collaborator} returned unexpected status {status}"), body)
}

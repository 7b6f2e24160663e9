//! The ledger collaborator: paginated listing of incomplete payments and
//! partial-field patching, over the trait the engine depends on.

use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{LedgerPayment, PaymentPatch};
use crate::error::{Error, auth_error, transport_error};
use crate::gateway::{is_auth_failure, unexpected_status};

/// Remote operations the engine needs from the ledger.
pub trait LedgerStore {
    /// List every payment still in a non-terminal status.
    fn incomplete_payments(&self) -> Result<Vec<LedgerPayment>, Error>;

    /// Apply a partial update to one payment. Callers never send an empty
    /// patch; the first-write-wins rules are enforced before this point.
    fn patch_payment(&self, reference: Uuid, patch: &PaymentPatch) -> Result<(), Error>;
}

const PAGE_SIZE: usize = 100;

/// Blocking HTTP client for the ledger API.
pub struct HttpLedgerStore {
    base_url: String,
    auth_token: String,
    client: Client,
}

impl HttpLedgerStore {
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
}

#[derive(Deserialize)]
struct PaymentPage {
    count: usize,
    results: Vec<LedgerPayment>,
}

impl LedgerStore for HttpLedgerStore {
    fn incomplete_payments(&self) -> Result<Vec<LedgerPayment>, Error> {
        // Payments changed in the last hour are likely still mid-checkout;
        // leave them to a later cycle.
        let cutoff = Utc::now() - chrono::Duration::hours(1);
        let mut payments = Vec::new();

        loop {
            let response = self
                .client
                .get(self.url("/payments/"))
                .bearer_auth(&self.auth_token)
                .query(&[
                    ("status", "pending"),
                    ("modified__lt", &cutoff.to_rfc3339()),
                    ("limit", &PAGE_SIZE.to_string()),
                    ("offset", &payments.len().to_string()),
                ])
                .send()?;

            let status = response.status();
            if is_auth_failure(status) {
                return Err(auth_error(format!("ledger returned {status}")));
            }
            if !status.is_success() {
                return Err(unexpected_status("ledger", response));
            }

            let page: PaymentPage = response
                .json()
                .map_err(|e| transport_error(format!("cannot parse ledger response: {e}"), None))?;
            let page_len = page.results.len();
            payments.extend(page.results);

            if page_len < PAGE_SIZE || payments.len() >= page.count {
                return Ok(payments);
            }
        }
    }

    fn patch_payment(&self, reference: Uuid, patch: &PaymentPatch) -> Result<(), Error> {
        let response = self
            .client
            .patch(self.url(&format!("/payments/{reference}/")))
            .bearer_auth(&self.auth_token)
            .json(patch)
            .send()?;

        let status = response.status();
        if is_auth_failure(status) {
            return Err(auth_error(format!("ledger returned {status}")));
        }
        if !status.is_success() {
            return Err(unexpected_status("ledger", response));
        }
        Ok(())
    }
}

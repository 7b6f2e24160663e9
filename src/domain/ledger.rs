//! Types mirroring the ledger's payment records and the partial patches the
//! engine writes back to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::is_filled;

/// Lifecycle status of a payment record in the ledger.
///
/// A payment only ever moves `Pending` → one of the terminal statuses; the
/// engine never writes to a record that already reached a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Pending,
    Taken,
    Failed,
    Rejected,
    Expired,
}

impl LedgerStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LedgerStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityCheckStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Outcome of the external compliance review attached to a payment.
/// Consumed as an opaque verdict; how it is produced is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityCheck {
    pub status: SecurityCheckStatus,
    pub user_actioned: bool,
}

impl SecurityCheck {
    /// The reviewer accepted the payment and confirmed the decision.
    pub fn capture_approved(&self) -> bool {
        self.status == SecurityCheckStatus::Accepted && self.user_actioned
    }

    /// The reviewer rejected the payment and confirmed the decision.
    pub fn rejected_by_user(&self) -> bool {
        self.status == SecurityCheckStatus::Rejected && self.user_actioned
    }
}

/// A payment record as returned by the ledger API. Referenced, never owned:
/// the engine re-reads it every sweep and only writes back via [`PaymentPatch`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LedgerPayment {
    pub uuid: Uuid,
    #[serde(default)]
    pub processor_id: Option<String>,
    pub recipient_name: String,
    #[serde(default)]
    pub prisoner_number: Option<String>,
    /// Amount in pence
    pub amount: u64,
    pub status: LedgerStatus,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub security_check: Option<SecurityCheck>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub worldpay_id: Option<String>,
    #[serde(default)]
    pub cardholder_name: Option<String>,
    #[serde(default)]
    pub card_brand: Option<String>,
    #[serde(default)]
    pub card_number_first_digits: Option<String>,
    #[serde(default)]
    pub card_number_last_digits: Option<String>,
    #[serde(default)]
    pub card_expiry_date: Option<String>,
    #[serde(default)]
    pub billing_address: Option<serde_json::Value>,
}

impl LedgerPayment {
    /// Short human-readable reference used in notifications: the first 8 hex
    /// characters of the payment uuid, upper-cased.
    pub fn short_ref(&self) -> String {
        self.uuid.simple().to_string()[..8].to_uppercase()
    }

    pub fn has_email(&self) -> bool {
        is_filled(self.email.as_deref())
    }
}

/// A partial-field update for one ledger payment. Only fields that actually
/// changed are set; an empty patch must never be sent to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LedgerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worldpay_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardholder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number_first_digits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number_last_digits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<serde_json::Value>,
}

impl PaymentPatch {
    pub fn is_empty(&self) -> bool {
        *self == PaymentPatch::default()
    }
}
